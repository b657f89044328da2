//! The display surface shared between the renderer and the presentation
//! layer.
//!
//! Compute writes a frame into the texture while holding a [`ComputeGuard`];
//! the display reads it while holding a [`DisplayGuard`]. Each side blocks
//! until the other has released. The frame generation only advances when a
//! compute guard is released through [`ComputeGuard::complete`], so a failed
//! frame leaves the display on the last good one.

use crate::device::SURFACE_FORMAT;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceOwner {
    Free,
    Compute,
    Display,
}

#[derive(Debug)]
struct LockState {
    owner: SurfaceOwner,
    generation: u64,
}

/// Ownership hand-off for a shared surface.
#[derive(Debug)]
pub struct SurfaceLock {
    state: Mutex<LockState>,
    released: Condvar,
}

impl Default for SurfaceLock {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceLock {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LockState {
                owner: SurfaceOwner::Free,
                generation: 0,
            }),
            released: Condvar::new(),
        }
    }

    fn state(&self) -> MutexGuard<'_, LockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn acquire(&self, owner: SurfaceOwner) {
        let state = self.state();
        let mut state = self
            .released
            .wait_while(state, |s| s.owner != SurfaceOwner::Free)
            .unwrap_or_else(PoisonError::into_inner);
        state.owner = owner;
    }

    fn release(&self, frame_written: bool) {
        let mut state = self.state();
        state.owner = SurfaceOwner::Free;
        if frame_written {
            state.generation += 1;
        }
        drop(state);
        self.released.notify_all();
    }

    /// Block until the display has finished reading.
    pub fn acquire_for_compute(&self) -> ComputeGuard<'_> {
        self.acquire(SurfaceOwner::Compute);
        ComputeGuard {
            lock: self,
            written: false,
        }
    }

    /// Block until compute has finished writing.
    pub fn acquire_for_display(&self) -> DisplayGuard<'_> {
        self.acquire(SurfaceOwner::Display);
        let generation = self.state().generation;
        DisplayGuard {
            lock: self,
            generation,
        }
    }

    pub fn owner(&self) -> SurfaceOwner {
        self.state().owner
    }

    /// Frames written so far.
    pub fn generation(&self) -> u64 {
        self.state().generation
    }
}

/// Held by compute while it writes a frame.
#[must_use]
pub struct ComputeGuard<'a> {
    lock: &'a SurfaceLock,
    written: bool,
}

impl ComputeGuard<'_> {
    /// Release the surface with a new frame in it.
    pub fn complete(mut self) {
        self.written = true;
    }
}

impl Drop for ComputeGuard<'_> {
    fn drop(&mut self) {
        self.lock.release(self.written);
    }
}

/// Held by the display while it reads a frame.
#[must_use]
pub struct DisplayGuard<'a> {
    lock: &'a SurfaceLock,
    generation: u64,
}

impl DisplayGuard<'_> {
    /// Generation of the frame being read.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for DisplayGuard<'_> {
    fn drop(&mut self) {
        self.lock.release(false);
    }
}

/// An RGBA f32 storage texture plus its hand-off lock.
pub struct SharedSurface {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
    lock: SurfaceLock,
}

impl SharedSurface {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("fractalzoom_surface"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SURFACE_FORMAT,
            usage: wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            width,
            height,
            lock: SurfaceLock::new(),
        }
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn acquire_for_compute(&self) -> ComputeGuard<'_> {
        self.lock.acquire_for_compute()
    }

    pub fn acquire_for_display(&self) -> DisplayGuard<'_> {
        self.lock.acquire_for_display()
    }

    pub fn generation(&self) -> u64 {
        self.lock.generation()
    }
}
