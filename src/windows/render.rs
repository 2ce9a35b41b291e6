//! The per-window render cycle: snapshot damage, draw, present.
use arrayvec::ArrayVec;
use log::trace;
use std::{ptr::null_mut, rc::Rc};
use winapi::{
    shared::{
        dxgi1_2::{IDXGISwapChain1, DXGI_PRESENT_PARAMETERS},
        windef::RECT,
    },
    um::d2d1::{
        D2D1_ANTIALIAS_MODE_ALIASED, D2D1_COLOR_F, D2D1_MATRIX_3X2_F, D2D1_RECT_F,
    },
};

use super::{
    gfx::Gfx,
    utils::{check_hr, ComPtr, GfxError, GfxResult},
    window::Wnd,
};
use crate::dirty::{to_present_rects, DirtyRects, PresentRect, DIRTY_RECT_CAP};
use crate::geom::Rect;

const IDENTITY: D2D1_MATRIX_3X2_F = D2D1_MATRIX_3X2_F {
    matrix: [[1.0, 0.0], [0.0, 1.0], [0.0, 0.0]],
};

/// Render one window if it has pending damage.
///
/// Device loss anywhere in the cycle schedules a device recreation and
/// returns successfully; the lost frame's damage is folded back so it is
/// redrawn once the device is back.
pub(super) fn render_wnd(gfx: &Gfx, wnd: &Rc<Wnd>) -> GfxResult<()> {
    // A window procedure may call back into the pipeline mid-frame.
    if gfx.render_lock.is_held() {
        return Ok(());
    }

    if wnd.skip_render() || !wnd.is_visible() || gfx.recreate_scheduled() {
        return Ok(());
    }

    // Snapshot the damage under the data lock so invalidations raised by
    // event handlers from here on land in the next frame.
    {
        let _guard = gfx.data_lock.enter();
        let mut dirty = wnd.dirty.borrow_mut();
        if !dirty.needs_render() && wnd.bufs.borrow().is_ready() {
            return Ok(());
        }
        dirty.snapshot();
    }

    let _render = gfx.render_lock.enter();

    match render_frame(gfx, wnd) {
        Ok(()) => Ok(()),
        Err(GfxError::DeviceLost(hr)) => {
            trace!("device lost mid-frame (0x{:08x})", hr);
            gfx.schedule_recreate();
            wnd.dirty.borrow_mut().reclaim_render();
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn render_frame(gfx: &Gfx, wnd: &Rc<Wnd>) -> GfxResult<()> {
    let devices_cell = gfx.devices.borrow();
    let devices = match &*devices_cell {
        Some(d) => d,
        None => return Ok(()),
    };

    let client_size = wnd.client_size();

    // Build or resize the presentation buffers first. A fresh or resized
    // surface invalidates everything drawn so far.
    {
        let mut bufs = wnd.bufs.borrow_mut();
        if !bufs.is_ready() {
            bufs.recreate(devices, wnd.hwnd(), client_size)?;
            wnd.dirty.borrow_mut().mark_full();
            wnd.dirty.borrow_mut().snapshot();
        } else if bufs.size() != client_size {
            bufs.resize(devices, client_size)?;
            wnd.viewport().window_resized(client_size);
            wnd.dirty.borrow_mut().mark_full();
            wnd.dirty.borrow_mut().snapshot();
        }
    }

    let bufs = wnd.bufs.borrow();
    let target = match bufs.target() {
        Some(t) => t.clone(),
        None => return Ok(()),
    };
    let swapchain = match bufs.swapchain() {
        Some(s) => s.clone(),
        None => return Ok(()),
    };
    let size = bufs.size();
    drop(bufs);

    let dirty = wnd.dirty.borrow();
    let render_set = dirty.render_set();
    if render_set.is_empty() {
        return Ok(());
    }
    let present_rects = to_present_rects(render_set, size[0], size[1]);
    let paint_rects = paint_regions(render_set, present_rects.is_none());
    drop(dirty);

    let dc = &devices.d2d_ctx;
    let clear = wnd.clear_color();
    let color = D2D1_COLOR_F {
        r: clear.r,
        g: clear.g,
        b: clear.b,
        a: clear.a,
    };

    unsafe {
        dc.SetTarget(target.as_ptr() as _);
        dc.BeginDraw();
        dc.SetTransform(&IDENTITY);
    }

    // Every presented region starts from the clear color. On an
    // incremental frame pixels outside the dirty set must keep the
    // previously presented content, so the clear is clipped to each rect.
    match paint_rects.as_deref() {
        None => unsafe {
            dc.Clear(&color);
        },
        Some(rects) => {
            for r in rects {
                let clip = D2D1_RECT_F {
                    left: r.min.x,
                    top: r.min.y,
                    right: r.max.x,
                    bottom: r.max.y,
                };
                unsafe {
                    dc.PushAxisAlignedClip(&clip, D2D1_ANTIALIAS_MODE_ALIASED);
                    dc.Clear(&color);
                    dc.PopAxisAlignedClip();
                }
            }
        }
    }

    wnd.viewport().paint(dc, paint_rects.as_deref());

    unsafe {
        check_hr(dc.EndDraw(null_mut(), null_mut()))?;
        dc.SetTarget(null_mut());
    }

    present(&swapchain, present_rects.as_deref())?;

    wnd.note_frame_presented(present_rects.is_none());

    trace!(
        "presented {}",
        match &present_rects {
            Some(r) => format!("{} dirty rect(s)", r.len()),
            None => "the full surface".to_owned(),
        }
    );

    Ok(())
}

/// The regions a frame clears and repaints: every dirty rectangle on an
/// incremental frame, or the whole target (`None`) when presenting full.
fn paint_regions(render_set: &DirtyRects, full: bool) -> Option<Vec<Rect>> {
    if full {
        None
    } else {
        Some(render_set.rects().to_vec())
    }
}

/// Present the frame: the whole surface when `rects` is `None`, the
/// given sub-rectangles otherwise.
fn present(swapchain: &ComPtr<IDXGISwapChain1>, rects: Option<&[PresentRect]>) -> GfxResult<()> {
    let rects = match rects {
        Some(rects) => rects,
        None => {
            unsafe {
                check_hr(swapchain.Present(0, 0))?;
            }
            return Ok(());
        }
    };

    let mut native: ArrayVec<[RECT; DIRTY_RECT_CAP]> = ArrayVec::new();
    for r in rects {
        native.push(RECT {
            left: r.left,
            top: r.top,
            right: r.right,
            bottom: r.bottom,
        });
    }

    let params = DXGI_PRESENT_PARAMETERS {
        DirtyRectsCount: native.len() as u32,
        pDirtyRects: if native.is_empty() {
            null_mut()
        } else {
            native.as_mut_ptr()
        },
        pScrollRect: null_mut(),
        pScrollOffset: null_mut(),
    };

    unsafe {
        check_hr(swapchain.Present1(0, 0, &params))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incremental_frames_clear_every_painted_rect() {
        let mut set = DirtyRects::new();
        set.mark(Rect::new(0.0, 0.0, 10.0, 10.0));
        set.mark(Rect::new(20.0, 20.0, 30.0, 30.0));

        // The draw pass clears exactly these regions before painting.
        let regions = paint_regions(&set, false).unwrap();
        assert_eq!(regions, set.rects());

        // A full present clears the whole target instead.
        assert!(paint_regions(&set, true).is_none());
    }
}
