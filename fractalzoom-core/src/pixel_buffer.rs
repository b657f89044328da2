use serde::{Deserialize, Serialize};

/// Channels per pixel (RGB).
pub const CHANNELS: usize = 3;

/// Row-major RGB image with f32 channels in [0, 1].
///
/// The backend that renders a frame owns its buffer; the display layer only
/// borrows it through `as_slice` for texture upload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl PixelBuffer {
    /// Black image of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width as usize * height as usize * CHANNELS],
        }
    }

    /// Wrap existing channel data. Fails if the length does not match.
    pub fn from_vec(width: u32, height: u32, data: Vec<f32>) -> Result<Self, String> {
        let expected = width as usize * height as usize * CHANNELS;
        if data.len() != expected {
            return Err(format!(
                "pixel data has {} floats, expected {} for {}x{}",
                data.len(),
                expected,
                width,
                height
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Floats per row.
    pub fn row_stride(&self) -> usize {
        self.width as usize * CHANNELS
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }

    pub fn pixel(&self, x: u32, y: u32) -> [f32; 3] {
        let i = self.offset(x, y);
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgb: [f32; 3]) {
        let i = self.offset(x, y);
        self.data[i..i + CHANNELS].copy_from_slice(&rgb);
    }

    /// One mutable slice per row, for row-parallel writers.
    pub fn rows_mut(&mut self) -> std::slice::ChunksExactMut<'_, f32> {
        let stride = self.row_stride().max(1);
        self.data.chunks_exact_mut(stride)
    }

    /// Copy `rows` rows of `src`, starting at `src_row`, into this buffer at
    /// `dst_row`. Both buffers must have the same width.
    pub fn copy_rows_from(
        &mut self,
        src: &PixelBuffer,
        src_row: u32,
        dst_row: u32,
        rows: u32,
    ) -> Result<(), String> {
        if src.width != self.width {
            return Err(format!(
                "row copy width mismatch: source {} vs destination {}",
                src.width, self.width
            ));
        }
        if src_row + rows > src.height || dst_row + rows > self.height {
            return Err(format!(
                "row copy out of range: {} rows from {} (of {}) to {} (of {})",
                rows, src_row, src.height, dst_row, self.height
            ));
        }
        let stride = self.row_stride();
        let len = rows as usize * stride;
        let src_start = src_row as usize * stride;
        let dst_start = dst_row as usize * stride;
        self.data[dst_start..dst_start + len].copy_from_slice(&src.data[src_start..src_start + len]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_black() {
        let buf = PixelBuffer::new(4, 3);
        assert_eq!(buf.as_slice().len(), 4 * 3 * 3);
        assert!(buf.as_slice().iter().all(|&c| c == 0.0));
    }

    #[test]
    fn set_and_get_pixel_row_major() {
        let mut buf = PixelBuffer::new(4, 3);
        buf.set_pixel(2, 1, [0.1, 0.2, 0.3]);
        assert_eq!(buf.pixel(2, 1), [0.1, 0.2, 0.3]);
        let offset = (4 + 2) * 3;
        assert_eq!(&buf.as_slice()[offset..offset + 3], &[0.1, 0.2, 0.3]);
    }

    #[test]
    fn from_vec_checks_length() {
        assert!(PixelBuffer::from_vec(2, 2, vec![0.0; 12]).is_ok());
        assert!(PixelBuffer::from_vec(2, 2, vec![0.0; 11]).is_err());
    }

    #[test]
    fn copy_rows_places_tile_at_offset() {
        let mut tile = PixelBuffer::new(3, 2);
        tile.set_pixel(0, 0, [1.0, 1.0, 1.0]);
        tile.set_pixel(2, 1, [0.5, 0.5, 0.5]);

        let mut full = PixelBuffer::new(3, 5);
        full.copy_rows_from(&tile, 0, 2, 2).unwrap();

        assert_eq!(full.pixel(0, 2), [1.0, 1.0, 1.0]);
        assert_eq!(full.pixel(2, 3), [0.5, 0.5, 0.5]);
        assert_eq!(full.pixel(0, 0), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn copy_rows_rejects_overflowing_range() {
        let tile = PixelBuffer::new(3, 2);
        let mut full = PixelBuffer::new(3, 5);
        assert!(full.copy_rows_from(&tile, 0, 4, 2).is_err());
        assert!(full.copy_rows_from(&PixelBuffer::new(4, 2), 0, 0, 2).is_err());
    }

    #[test]
    fn rows_mut_yields_one_slice_per_row() {
        let mut buf = PixelBuffer::new(5, 4);
        assert_eq!(buf.rows_mut().count(), 4);
        assert!(buf.rows_mut().all(|r| r.len() == 15));
    }
}
