//! Per-window swapchain and render-target management.
use log::debug;
use std::{mem::MaybeUninit, ptr::null_mut};
use winapi::{
    shared::{
        dxgi::{IDXGISurface, DXGI_SWAP_EFFECT_FLIP_SEQUENTIAL},
        dxgi1_2::{IDXGISwapChain1, DXGI_SWAP_CHAIN_DESC1},
        dxgiformat::DXGI_FORMAT_R8G8B8A8_UNORM,
        dxgitype::{DXGI_SAMPLE_DESC, DXGI_USAGE_RENDER_TARGET_OUTPUT},
        windef::HWND,
    },
    um::{
        d2d1_1::{
            ID2D1Bitmap1, D2D1_BITMAP_OPTIONS_CANNOT_DRAW, D2D1_BITMAP_OPTIONS_TARGET,
            D2D1_BITMAP_PROPERTIES1,
        },
        dcommon::{D2D1_ALPHA_MODE_PREMULTIPLIED, D2D1_PIXEL_FORMAT},
        unknwnbase::IUnknown,
    },
    Interface,
};

use super::{
    gfx::Devices,
    utils::{check_hr, ComPtr, GfxResult},
};

/// The number of swapchain back buffers. Two is the minimum the flip
/// model accepts.
const BUFFER_COUNT: u32 = 2;

/// A window's presentation resources: the flip-model swapchain and the
/// Direct2D bitmap wrapping its back buffer.
///
/// Both halves are device-dependent; on device loss `release` drops them
/// and `recreate` builds fresh ones against the new device.
#[derive(Default)]
pub(super) struct FrameBufs {
    swapchain: Option<ComPtr<IDXGISwapChain1>>,
    target: Option<ComPtr<ID2D1Bitmap1>>,
    /// The current buffer size in pixels. Kept here because querying the
    /// bitmap on every frame is wasteful.
    size: [u32; 2],
}

impl FrameBufs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(&self) -> [u32; 2] {
        self.size
    }

    pub fn is_ready(&self) -> bool {
        self.swapchain.is_some() && self.target.is_some()
    }

    pub fn swapchain(&self) -> Option<&ComPtr<IDXGISwapChain1>> {
        self.swapchain.as_ref()
    }

    pub fn target(&self) -> Option<&ComPtr<ID2D1Bitmap1>> {
        self.target.as_ref()
    }

    /// Build the swapchain and target bitmap for `hwnd` at `size`.
    /// Existing resources are dropped first.
    pub fn recreate(&mut self, devices: &Devices, hwnd: HWND, size: [u32; 2]) -> GfxResult<()> {
        self.release();

        let size = [size[0].max(1), size[1].max(1)];
        debug!("creating a {}x{} swapchain", size[0], size[1]);

        let desc = DXGI_SWAP_CHAIN_DESC1 {
            Width: size[0],
            Height: size[1],
            Format: DXGI_FORMAT_R8G8B8A8_UNORM,
            Stereo: 0,
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: 1,
                Quality: 0,
            },
            BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
            BufferCount: BUFFER_COUNT,
            Scaling: 0, // DXGI_SCALING_STRETCH
            SwapEffect: DXGI_SWAP_EFFECT_FLIP_SEQUENTIAL,
            AlphaMode: 0, // DXGI_ALPHA_MODE_UNSPECIFIED
            Flags: 0,
        };

        let swapchain = unsafe {
            let mut out = MaybeUninit::uninit();
            check_hr(devices.dxgi_factory.CreateSwapChainForHwnd(
                devices.d3d.as_ptr() as *mut IUnknown,
                hwnd,
                &desc,
                null_mut(), // windowed
                null_mut(), // no output restriction
                out.as_mut_ptr(),
            ))?;
            ComPtr::from_ptr_unchecked(out.assume_init())
        };

        let target = make_target_bitmap(devices, &swapchain, DXGI_FORMAT_R8G8B8A8_UNORM)?;

        self.swapchain = Some(swapchain);
        self.target = Some(target);
        self.size = size;
        Ok(())
    }

    /// Resize the swapchain buffers. A request matching the current size
    /// is a no-op. The target bitmap holds a buffer reference, so it is
    /// dropped for the duration of the resize and rebuilt after.
    pub fn resize(&mut self, devices: &Devices, size: [u32; 2]) -> GfxResult<()> {
        if resize_is_noop(self.size, size) {
            return Ok(());
        }
        let size = [size[0].max(1), size[1].max(1)];
        let swapchain = match &self.swapchain {
            Some(s) => s.clone(),
            None => return Ok(()),
        };

        self.target = None;

        unsafe {
            check_hr(swapchain.ResizeBuffers(
                BUFFER_COUNT,
                size[0],
                size[1],
                DXGI_FORMAT_R8G8B8A8_UNORM,
                0,
            ))?;
        }

        self.target = Some(make_target_bitmap(
            devices,
            &swapchain,
            DXGI_FORMAT_R8G8B8A8_UNORM,
        )?);
        self.size = size;
        Ok(())
    }

    /// Drop everything. Idempotent; used on device loss and window
    /// destruction.
    pub fn release(&mut self) {
        self.target = None;
        self.swapchain = None;
        self.size = [0, 0];
    }
}

/// `true` when the buffers already have the (clamped) requested size.
fn resize_is_noop(current: [u32; 2], requested: [u32; 2]) -> bool {
    [requested[0].max(1), requested[1].max(1)] == current
}

/// Wrap the swapchain's current back buffer in a Direct2D target bitmap.
/// `format` must match the buffer format the swapchain currently holds.
fn make_target_bitmap(
    devices: &Devices,
    swapchain: &ComPtr<IDXGISwapChain1>,
    format: u32,
) -> GfxResult<ComPtr<ID2D1Bitmap1>> {
    let surface: ComPtr<IDXGISurface> = unsafe {
        let mut out = MaybeUninit::uninit();
        check_hr(swapchain.GetBuffer(0, &IDXGISurface::uuidof(), out.as_mut_ptr()))?;
        ComPtr::from_ptr_unchecked(out.assume_init() as *mut IDXGISurface)
    };

    let props = D2D1_BITMAP_PROPERTIES1 {
        pixelFormat: D2D1_PIXEL_FORMAT {
            format,
            alphaMode: D2D1_ALPHA_MODE_PREMULTIPLIED,
        },
        dpiX: 96.0,
        dpiY: 96.0,
        bitmapOptions: D2D1_BITMAP_OPTIONS_TARGET | D2D1_BITMAP_OPTIONS_CANNOT_DRAW,
        colorContext: null_mut(),
    };

    unsafe {
        let mut out = MaybeUninit::uninit();
        check_hr(
            devices
                .d2d_ctx
                .CreateBitmapFromDxgiSurface(surface.as_ptr(), &props, out.as_mut_ptr()),
        )?;
        Ok(ComPtr::from_ptr_unchecked(out.assume_init()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_resize_to_the_same_size_is_a_no_op() {
        assert!(!resize_is_noop([640, 480], [800, 600]));
        assert!(resize_is_noop([800, 600], [800, 600]));

        // Requests are clamped to 1x1 before the comparison, so a zero
        // request against 1x1 buffers changes nothing.
        assert!(resize_is_noop([1, 1], [0, 0]));
    }

    #[test]
    fn fresh_buffers_are_not_ready_and_release_is_idempotent() {
        let mut bufs = FrameBufs::new();
        assert!(!bufs.is_ready());
        assert_eq!(bufs.size(), [0, 0]);

        bufs.release();
        bufs.release();
        assert!(!bufs.is_ready());
        assert_eq!(bufs.size(), [0, 0]);
    }
}
