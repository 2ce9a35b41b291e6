//! Shared graphics state: the D3D/D2D device pair, device-loss recovery
//! and the cooperative locks guarding the frame pipeline.
use log::{info, warn};
use once_cell::unsync::OnceCell;
use std::{
    cell::{Cell, RefCell},
    mem::MaybeUninit,
    ptr::null_mut,
    rc::Rc,
};
use winapi::{
    shared::{
        dxgi::{CreateDXGIFactory1, IDXGIDevice, IDXGIFactory1},
        dxgi1_2::IDXGIFactory2,
        winerror::E_NOINTERFACE,
    },
    um::{
        d2d1_1::{
            D2D1CreateDevice, ID2D1Device, ID2D1DeviceContext, D2D1_DEVICE_CONTEXT_OPTIONS_NONE,
        },
        d3d11, d3dcommon,
    },
    Interface,
};

use super::{
    utils::{check_hr, ComPtr, GfxError, GfxResult},
    window,
};
use crate::geom::Rect;

/// What a window's content tree looks like to the frame pipeline. The
/// window core drives it; a higher layer implements it. A viewport is
/// also the root [`Control`](crate::iface::Control) for input routing.
pub trait Viewport: crate::iface::Control {
    /// The same object as the root control. Implementations return
    /// `self`.
    fn as_control(self: Rc<Self>) -> crate::iface::ControlRc;

    /// Device-dependent resources must be rebuilt; a new device is in
    /// place.
    fn recreate_device(&self) {}

    /// Device-dependent resources must be dropped now (the device is
    /// about to go away).
    fn release_device(&self) {}

    /// Draw into `dc`. `dirty` is the set of regions that will be
    /// presented, or `None` for a full-surface redraw; drawing may be
    /// clipped to it.
    fn paint(&self, dc: &ComPtr<ID2D1DeviceContext>, dirty: Option<&[Rect]>);

    /// The window's client area changed size (in pixels).
    fn window_resized(&self, _size: [u32; 2]) {}

    /// The user asked to close the window. Return `false` to veto.
    fn close_requested(&self) -> bool {
        true
    }
}

/// A cooperative, same-thread reentrant lock.
///
/// The frame pipeline runs on one thread, but window procedures re-enter
/// it (e.g. `WM_PAINT` arriving while a frame is underway). A plain mutex
/// would self-deadlock, so this only counts depth; callers that must not
/// re-enter check [`UiLock::is_held`] first.
#[derive(Debug, Default)]
pub struct UiLock {
    depth: Cell<u32>,
}

pub struct UiLockGuard<'a>(&'a UiLock);

impl UiLock {
    pub fn enter(&self) -> UiLockGuard<'_> {
        self.depth.set(self.depth.get() + 1);
        UiLockGuard(self)
    }

    pub fn is_held(&self) -> bool {
        self.depth.get() > 0
    }
}

impl Drop for UiLockGuard<'_> {
    fn drop(&mut self) {
        self.0.depth.set(self.0.depth.get() - 1);
    }
}

/// The device-dependent half of [`Gfx`], dropped and rebuilt as a unit on
/// device loss.
pub(super) struct Devices {
    pub d3d: ComPtr<d3d11::ID3D11Device>,
    pub dxgi_factory: ComPtr<IDXGIFactory2>,
    pub d2d_device: ComPtr<ID2D1Device>,
    /// The sole device context; every window renders through it by
    /// retargeting (`SetTarget`).
    pub d2d_ctx: ComPtr<ID2D1DeviceContext>,
}

/// Process-wide graphics state for the UI thread.
pub struct Gfx {
    pub(super) devices: RefCell<Option<Devices>>,
    need_recreate: Cell<bool>,
    /// Guards window data (dirty regions, control references) against
    /// re-entrant mutation during a frame.
    pub(super) data_lock: UiLock,
    /// Guards the render pipeline; a held render lock makes `render_wnd`
    /// a no-op for re-entrant callers.
    pub(super) render_lock: UiLock,
}

thread_local! {
    static GFX: OnceCell<Rc<Gfx>> = OnceCell::new();
}

impl Gfx {
    /// The UI thread's graphics state, created on first use.
    pub fn global() -> Rc<Gfx> {
        GFX.with(|cell| {
            cell.get_or_init(|| {
                let devices = create_devices().unwrap_or_else(|e| {
                    panic!("could not create the render device: {}", e);
                });
                Rc::new(Gfx {
                    devices: RefCell::new(Some(devices)),
                    need_recreate: Cell::new(false),
                    data_lock: UiLock::default(),
                    render_lock: UiLock::default(),
                })
            })
            .clone()
        })
    }

    /// Ask for the device to be torn down and rebuilt before the next
    /// frame. Called whenever a graphics call reports device loss; safe to
    /// call repeatedly and from mid-render.
    pub fn schedule_recreate(&self) {
        if !self.need_recreate.replace(true) {
            warn!("graphics device lost; scheduling recreation");
        }
    }

    pub(super) fn recreate_scheduled(&self) -> bool {
        self.need_recreate.get()
    }

    /// Rebuild the device if a recreation is scheduled. Every window's
    /// device-dependent resources are released first and rebuilt after,
    /// and every surface is invalidated in full.
    pub(super) fn recreate_if_needed(&self) -> GfxResult<()> {
        if !self.need_recreate.get() {
            return Ok(());
        }

        info!("recreating the graphics device");

        window::for_each_wnd(|wnd| wnd.release_device_resources());
        *self.devices.borrow_mut() = None;

        let devices = create_devices()?;
        *self.devices.borrow_mut() = Some(devices);
        self.need_recreate.set(false);

        window::for_each_wnd(|wnd| wnd.device_recreated(self));
        Ok(())
    }

    /// Drive one frame: recover from device loss if needed, then render
    /// every window with pending damage.
    pub fn run_frame(&self) {
        if let Err(e) = self.recreate_if_needed() {
            // The GPU may still be resetting; try again next frame.
            warn!("device recreation failed, will retry: {}", e);
            return;
        }

        window::for_each_wnd(|wnd| {
            if let Err(e) = super::render::render_wnd(self, wnd) {
                warn!("rendering failed: {}", e);
                self.schedule_recreate();
            }
        });
    }
}

fn create_devices() -> GfxResult<Devices> {
    let feature_levels = &[
        d3dcommon::D3D_FEATURE_LEVEL_11_1,
        d3dcommon::D3D_FEATURE_LEVEL_11_0,
        d3dcommon::D3D_FEATURE_LEVEL_10_1,
        d3dcommon::D3D_FEATURE_LEVEL_10_0,
        d3dcommon::D3D_FEATURE_LEVEL_9_3,
        d3dcommon::D3D_FEATURE_LEVEL_9_2,
        d3dcommon::D3D_FEATURE_LEVEL_9_1,
    ];

    // Direct2D interop requires BGRA support.
    let d3d = unsafe {
        let mut out = MaybeUninit::uninit();
        check_hr(d3d11::D3D11CreateDevice(
            null_mut(), // default adapter
            d3dcommon::D3D_DRIVER_TYPE_HARDWARE,
            null_mut(),
            d3d11::D3D11_CREATE_DEVICE_BGRA_SUPPORT,
            feature_levels.as_ptr(),
            feature_levels.len() as _,
            d3d11::D3D11_SDK_VERSION,
            out.as_mut_ptr(),
            null_mut(), // not interested in which feature level is chosen
            null_mut(), // not interested in `ID3D11DeviceContext`
        ))?;
        ComPtr::from_ptr_unchecked(out.assume_init())
    };

    let dxgi_device: ComPtr<IDXGIDevice> = d3d
        .query_interface()
        .ok_or(GfxError::Failed(E_NOINTERFACE))?;

    let d2d_device = unsafe {
        let mut out = MaybeUninit::uninit();
        check_hr(D2D1CreateDevice(
            dxgi_device.as_ptr(),
            null_mut(), // default creation properties
            out.as_mut_ptr(),
        ))?;
        ComPtr::from_ptr_unchecked(out.assume_init())
    };

    let d2d_ctx = unsafe {
        let mut out = MaybeUninit::uninit();
        check_hr(d2d_device.CreateDeviceContext(D2D1_DEVICE_CONTEXT_OPTIONS_NONE, out.as_mut_ptr()))?;
        ComPtr::from_ptr_unchecked(out.assume_init())
    };

    let dxgi_factory = unsafe {
        let mut out: MaybeUninit<*mut IDXGIFactory1> = MaybeUninit::uninit();
        check_hr(CreateDXGIFactory1(
            &IDXGIFactory1::uuidof(),
            out.as_mut_ptr() as _,
        ))?;
        ComPtr::from_ptr_unchecked(out.assume_init())
    };
    let dxgi_factory: ComPtr<IDXGIFactory2> = dxgi_factory
        .query_interface()
        .ok_or(GfxError::Failed(E_NOINTERFACE))?;

    Ok(Devices {
        d3d,
        dxgi_factory,
        d2d_device,
        d2d_ctx,
    })
}
