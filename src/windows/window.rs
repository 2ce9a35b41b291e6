//! Native window management: creation, the window procedure, input
//! translation and the public window operations.
use log::debug;
use rgb::RGBA;
use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    fmt,
    mem::MaybeUninit,
    ptr::null_mut,
    rc::{Rc, Weak},
};
use wchar::wch_c;
use winapi::{
    shared::{
        minwindef::{HIWORD, LOWORD, LPARAM, LRESULT, UINT, WPARAM},
        windef::{HCURSOR, HWND, POINT, RECT},
    },
    um::{libloaderapi, winuser},
};

use super::{
    codecvt::str_to_c_wstr,
    gfx::{Gfx, Viewport},
    framebuf::FrameBufs,
    utils::{assert_win32_nonnull, assert_win32_ok},
};
use crate::{
    dirty::DirtyRegion,
    geom::Rect,
    iface::{ControlRc, CursorShape, Key, Modifiers, MouseEventKind, MouseInput, WndConfig},
    input::{InputRouter, ACCESS_KEY_COUNT},
    popup::{PopupSlot, PopupToggle},
    registry::NamedControlMap,
    style::StyleSheet,
};
use cgmath::Point2;

const WND_CLASS: &[u16] = wch_c!("ShojiWnd");
const WND_CLASS_POPUP: &[u16] = wch_c!("ShojiPopupWnd");

const DEFAULT_WND_SIZE: [u32; 2] = [640, 480];
const MIN_TRACK_PAD: [i32; 2] = [100, 40];

/// Maps `WM_MOUSEFIRST..=WM_MOUSELAST` to semantic event kinds.
const MOUSE_EVENT_MAP: [MouseEventKind; 15] = {
    use MouseEventKind::*;
    [
        Move,        // WM_MOUSEMOVE     0x0200
        LButtonDown, // WM_LBUTTONDOWN   0x0201
        LButtonUp,   // WM_LBUTTONUP     0x0202
        Unknown,     // WM_LBUTTONDBLCLK 0x0203
        RButtonDown, // WM_RBUTTONDOWN   0x0204
        RButtonUp,   // WM_RBUTTONUP     0x0205
        Unknown,     // WM_RBUTTONDBLCLK 0x0206
        MButtonDown, // WM_MBUTTONDOWN   0x0207
        MButtonUp,   // WM_MBUTTONUP     0x0208
        Unknown,     // WM_MBUTTONDBLCLK 0x0209
        WheelV,      // WM_MOUSEWHEEL    0x020A
        Unknown,     // WM_XBUTTONDOWN   0x020B
        Unknown,     // WM_XBUTTONUP     0x020C
        Unknown,     // WM_XBUTTONDBLCLK 0x020D
        WheelH,      // WM_MOUSEHWHEEL   0x020E
    ]
};

/// A handle to a window. Handles are reference-counted; two handles
/// compare equal when they denote the same window.
#[derive(Clone)]
pub struct HWnd {
    pub(super) wnd: Rc<Wnd>,
}

impl PartialEq for HWnd {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.wnd, &other.wnd)
    }
}

impl Eq for HWnd {}

impl std::hash::Hash for HWnd {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        (&*self.wnd as *const Wnd).hash(state);
    }
}

impl fmt::Debug for HWnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HWnd").field(&self.wnd.hwnd.get()).finish()
    }
}

/// Window creation parameters.
pub struct WndOptions {
    pub config: WndConfig,
    pub title: String,
    /// The initial client size in pixels; `[0, 0]` picks a default.
    pub size: [u32; 2],
    pub parent: Option<HWnd>,
    pub viewport: Rc<dyn Viewport>,
    pub clear_color: RGBA<f32>,
}

pub(super) struct Wnd {
    hwnd: Cell<HWND>,
    config: WndConfig,
    gfx: Rc<Gfx>,
    viewport: Rc<dyn Viewport>,
    parent: RefCell<Weak<Wnd>>,
    children: RefCell<Vec<HWnd>>,
    popup: RefCell<PopupSlot<HWnd>>,
    cursor: Cell<HCURSOR>,
    clear_color: Cell<RGBA<f32>>,
    /// Screen position of the window's top-left corner.
    pos: Cell<[i32; 2]>,
    /// Client size in pixels. The swapchain follows this lazily during
    /// the next render.
    size: Cell<[u32; 2]>,
    /// Frame-decoration insets (left, top, right, bottom), from
    /// `AdjustWindowRect`.
    adjust: Cell<[i32; 4]>,
    /// `WM_MOUSEACTIVATE` verdict, fixed by `config` at creation.
    ma_return_code: LRESULT,
    moving_resizing: Cell<bool>,
    /// Rendering administratively disabled (e.g. while a window is being
    /// torn down). The render cycle treats the window as having no work.
    skip_render: Cell<bool>,
    pub(super) input: InputRouter,
    pub(super) names: RefCell<NamedControlMap>,
    pub(super) dirty: RefCell<DirtyRegion>,
    pub(super) bufs: RefCell<FrameBufs>,
    style_sheet: RefCell<Option<Rc<dyn StyleSheet>>>,
    #[cfg(debug_assertions)]
    dbg_full_frames: Cell<u32>,
    #[cfg(debug_assertions)]
    dbg_partial_frames: Cell<u32>,
}

thread_local! {
    /// All live windows on this thread, keyed by native handle.
    static WND_REGISTRY: RefCell<HashMap<isize, Rc<Wnd>>> = RefCell::new(HashMap::new());
    /// The window being created, parked here until its `WM_CREATE`
    /// arrives with the native handle.
    static WND_UNDER_CONSTRUCTION: RefCell<Option<Rc<Wnd>>> = RefCell::new(None);
    static WND_CLASSES_REGISTERED: Cell<bool> = Cell::new(false);
}

fn wnd_by_hwnd(hwnd: HWND) -> Option<Rc<Wnd>> {
    WND_REGISTRY.with(|reg| reg.borrow().get(&(hwnd as isize)).cloned())
}

/// Visit every live window. The registry is not borrowed during the
/// callback, so windows may be created or destroyed from inside it.
pub(super) fn for_each_wnd(mut f: impl FnMut(&Rc<Wnd>)) {
    let wnds: Vec<Rc<Wnd>> = WND_REGISTRY.with(|reg| reg.borrow().values().cloned().collect());
    for wnd in &wnds {
        f(wnd);
    }
}

/// Register the two window classes (normal and drop-shadow popup) the
/// first time a window is created on this thread.
fn ensure_wnd_classes() {
    WND_CLASSES_REGISTERED.with(|done| {
        if done.get() {
            return;
        }
        done.set(true);

        let hinstance = unsafe { libloaderapi::GetModuleHandleW(null_mut()) };

        let mut wnd_class = winuser::WNDCLASSW {
            style: 0,
            lpfnWndProc: Some(wnd_proc),
            hInstance: hinstance,
            lpszClassName: WND_CLASS.as_ptr(),
            cbClsExtra: 0,
            cbWndExtra: 0,
            hIcon: null_mut(),
            hCursor: null_mut(),
            hbrBackground: null_mut(),
            lpszMenuName: null_mut(),
        };
        unsafe { winuser::RegisterClassW(&wnd_class) };

        wnd_class.style = winuser::CS_DROPSHADOW;
        wnd_class.lpszClassName = WND_CLASS_POPUP.as_ptr();
        unsafe { winuser::RegisterClassW(&wnd_class) };
    });
}

impl HWnd {
    /// Create a native window. It starts hidden; call [`HWnd::show`].
    pub fn new(options: WndOptions) -> HWnd {
        ensure_wnd_classes();

        let popup = options.config.contains(WndConfig::POPUP);
        let style = if popup {
            winuser::WS_POPUPWINDOW
        } else {
            winuser::WS_OVERLAPPEDWINDOW
        };
        let mut ex_style = 0;
        if options.config.contains(WndConfig::TOOL) {
            ex_style |= winuser::WS_EX_TOOLWINDOW;
        }

        // Frame-decoration insets for client-size adjustments.
        let mut adjust_rect = RECT {
            left: 0,
            top: 0,
            right: 0,
            bottom: 0,
        };
        unsafe {
            assert_win32_ok(winuser::AdjustWindowRect(&mut adjust_rect, style, 0));
        }
        let adjust = [
            adjust_rect.left,
            adjust_rect.top,
            adjust_rect.right,
            adjust_rect.bottom,
        ];

        let size = if options.size == [0, 0] {
            DEFAULT_WND_SIZE
        } else {
            [options.size[0].max(1), options.size[1].max(1)]
        };
        let outer = [
            size[0] as i32 + adjust[2] - adjust[0],
            size[1] as i32 + adjust[3] - adjust[1],
        ];

        // Center new top-level windows on the primary screen.
        let scr = unsafe {
            [
                winuser::GetSystemMetrics(winuser::SM_CXFULLSCREEN),
                winuser::GetSystemMetrics(winuser::SM_CYFULLSCREEN),
            ]
        };
        let pos = [(scr[0] - outer[0]) / 2, (scr[1] - outer[1]) / 2];

        let wnd = Rc::new(Wnd {
            hwnd: Cell::new(null_mut()),
            config: options.config,
            gfx: Gfx::global(),
            viewport: Rc::clone(&options.viewport),
            parent: RefCell::new(
                options
                    .parent
                    .as_ref()
                    .map(|p| Rc::downgrade(&p.wnd))
                    .unwrap_or_default(),
            ),
            children: RefCell::new(Vec::new()),
            popup: RefCell::new(PopupSlot::new()),
            cursor: Cell::new(unsafe {
                winuser::LoadCursorW(null_mut(), winuser::IDC_ARROW)
            }),
            clear_color: Cell::new(options.clear_color),
            pos: Cell::new(pos),
            size: Cell::new(size),
            adjust: Cell::new(adjust),
            ma_return_code: if popup {
                winuser::MA_NOACTIVATE as LRESULT
            } else {
                winuser::MA_ACTIVATE as LRESULT
            },
            moving_resizing: Cell::new(false),
            skip_render: Cell::new(false),
            input: InputRouter::new(),
            names: RefCell::new(NamedControlMap::new()),
            dirty: RefCell::new(DirtyRegion::new()),
            bufs: RefCell::new(FrameBufs::new()),
            style_sheet: RefCell::new(None),
            #[cfg(debug_assertions)]
            dbg_full_frames: Cell::new(0),
            #[cfg(debug_assertions)]
            dbg_partial_frames: Cell::new(0),
        });

        WND_UNDER_CONSTRUCTION.with(|slot| {
            *slot.borrow_mut() = Some(Rc::clone(&wnd));
        });

        let title = str_to_c_wstr(&options.title);
        let parent_hwnd = options
            .parent
            .as_ref()
            .map_or(null_mut(), |p| p.wnd.hwnd.get());
        let hinstance = unsafe { libloaderapi::GetModuleHandleW(null_mut()) };

        let hwnd = unsafe {
            winuser::CreateWindowExW(
                ex_style,
                if popup {
                    WND_CLASS_POPUP.as_ptr()
                } else {
                    WND_CLASS.as_ptr()
                },
                title.as_ptr(),
                style,
                pos[0],
                pos[1],
                outer[0],
                outer[1],
                parent_hwnd,
                null_mut(),
                hinstance,
                null_mut(),
            )
        };
        assert_win32_nonnull(hwnd);
        debug_assert_eq!(wnd.hwnd.get(), hwnd);

        // Alt+A..Z access keys.
        for i in 0..ACCESS_KEY_COUNT as i32 {
            unsafe {
                winuser::RegisterHotKey(hwnd, i, winuser::MOD_ALT as UINT, b'A' as UINT + i as UINT);
            }
        }

        let handle = HWnd { wnd };
        if let Some(parent) = &options.parent {
            parent.wnd.children.borrow_mut().push(handle.clone());
        }
        handle
    }

    fn expect_hwnd(&self) -> HWND {
        let hwnd = self.wnd.hwnd.get();
        assert!(!hwnd.is_null(), "already destroyed");
        hwnd
    }

    /// Request a new client size. Requesting the current size only forces
    /// a full redraw.
    pub fn resize(&self, size: [u32; 2]) {
        if self.wnd.size.get() == size {
            self.wnd.dirty.borrow_mut().mark_full();
            return;
        }
        let adjust = self.wnd.adjust.get();
        let outer = [
            size[0] as i32 + adjust[2] - adjust[0],
            size[1] as i32 + adjust[3] - adjust[1],
        ];
        const FLAGS: UINT = winuser::SWP_NOACTIVATE
            | winuser::SWP_NOMOVE
            | winuser::SWP_NOZORDER
            | winuser::SWP_ASYNCWINDOWPOS;
        unsafe {
            winuser::SetWindowPos(self.expect_hwnd(), null_mut(), 0, 0, outer[0], outer[1], FLAGS);
        }
    }

    /// Move the window (screen coordinates). A no-op if unchanged.
    pub fn set_pos(&self, pos: [i32; 2]) {
        if self.wnd.pos.get() == pos {
            return;
        }
        self.wnd.pos.set(pos);
        const FLAGS: UINT =
            winuser::SWP_NOSIZE | winuser::SWP_NOZORDER | winuser::SWP_NOACTIVATE;
        unsafe {
            winuser::SetWindowPos(self.expect_hwnd(), null_mut(), pos[0], pos[1], 0, 0, FLAGS);
        }
    }

    pub fn map_to_screen(&self, pos: Point2<f32>) -> Point2<f32> {
        let mut origin = POINT { x: 0, y: 0 };
        unsafe {
            winuser::ClientToScreen(self.expect_hwnd(), &mut origin);
        }
        Point2::new(pos.x + origin.x as f32, pos.y + origin.y as f32)
    }

    pub fn map_rect_to_screen(&self, rect: Rect) -> Rect {
        let mut origin = POINT { x: 0, y: 0 };
        unsafe {
            winuser::ClientToScreen(self.expect_hwnd(), &mut origin);
        }
        rect.translate(cgmath::Vector2::new(origin.x as f32, origin.y as f32))
    }

    pub fn map_from_screen(&self, pos: Point2<f32>) -> Point2<f32> {
        let mut origin = POINT { x: 0, y: 0 };
        unsafe {
            winuser::ScreenToClient(self.expect_hwnd(), &mut origin);
        }
        Point2::new(pos.x + origin.x as f32, pos.y + origin.y as f32)
    }

    pub fn map_rect_from_screen(&self, rect: Rect) -> Rect {
        let mut origin = POINT { x: 0, y: 0 };
        unsafe {
            winuser::ScreenToClient(self.expect_hwnd(), &mut origin);
        }
        rect.translate(cgmath::Vector2::new(origin.x as f32, origin.y as f32))
    }

    /// Show `popup` anchored at `pos` (client coordinates of `self`).
    ///
    /// Showing the popup that is already open closes it instead; showing
    /// a different one closes the old one first.
    pub fn popup_window(&self, popup: &HWnd, pos: Point2<f32>) {
        let toggle = self.wnd.popup.borrow_mut().toggle(popup.clone());
        match toggle {
            PopupToggle::Closed(old) => old.close(),
            PopupToggle::Opened { replaced } => {
                if let Some(old) = replaced {
                    old.close();
                }
                let screen = self.map_to_screen(pos);
                popup.set_pos([screen.x as i32, screen.y as i32]);
                popup.show_no_activate();
            }
        }
    }

    /// Close the currently open popup, if any.
    pub fn close_popup(&self) {
        if let Some(popup) = self.wnd.popup.borrow_mut().take() {
            popup.close();
        }
    }

    /// Request the window to close. The close is posted, not synchronous,
    /// so it is safe to call from any event handler. A window that is
    /// already destroyed (e.g. a popup that dismissed itself on focus
    /// loss) is left alone.
    pub fn close(&self) {
        let hwnd = self.wnd.hwnd.get();
        if hwnd.is_null() {
            return;
        }
        unsafe {
            winuser::PostMessageW(hwnd, winuser::WM_CLOSE, 0, 0);
        }
    }

    pub fn show(&self) {
        unsafe {
            winuser::ShowWindow(self.expect_hwnd(), winuser::SW_SHOW);
        }
    }

    pub fn show_no_activate(&self) {
        unsafe {
            winuser::ShowWindow(self.expect_hwnd(), winuser::SW_SHOWNOACTIVATE);
        }
    }

    pub fn activate(&self) {
        unsafe {
            winuser::SetActiveWindow(self.expect_hwnd());
        }
    }

    pub fn is_visible(&self) -> bool {
        self.wnd.is_visible()
    }

    pub fn set_title(&self, title: &str) {
        let title = str_to_c_wstr(title);
        unsafe {
            winuser::DefWindowProcW(
                self.expect_hwnd(),
                winuser::WM_SETTEXT,
                0,
                title.as_ptr() as LPARAM,
            );
        }
    }

    pub fn set_clear_color(&self, color: RGBA<f32>) {
        self.wnd.clear_color.set(color);
        self.wnd.dirty.borrow_mut().mark_full();
    }

    pub fn set_cursor_shape(&self, shape: CursorShape) {
        let id = match shape {
            CursorShape::Arrow => winuser::IDC_ARROW,
            CursorShape::Hand => winuser::IDC_HAND,
            CursorShape::Crosshair => winuser::IDC_CROSS,
            CursorShape::Text => winuser::IDC_IBEAM,
            CursorShape::NotAllowed => winuser::IDC_NO,
            CursorShape::Move => winuser::IDC_SIZEALL,
            CursorShape::EwResize => winuser::IDC_SIZEWE,
            CursorShape::NsResize => winuser::IDC_SIZENS,
            CursorShape::Wait => winuser::IDC_WAIT,
            CursorShape::Help => winuser::IDC_HELP,
        };
        self.wnd
            .cursor
            .set(unsafe { winuser::LoadCursorW(null_mut(), id) });
    }

    /// Invalidate a region of the window (client coordinates).
    pub fn mark_dirty(&self, rect: Rect) {
        let _guard = self.wnd.gfx.data_lock.enter();
        self.wnd.dirty.borrow_mut().mark(rect);
    }

    /// Invalidate the whole window.
    pub fn mark_full_redraw(&self) {
        let _guard = self.wnd.gfx.data_lock.enter();
        self.wnd.dirty.borrow_mut().mark_full();
    }

    pub fn client_size(&self) -> [u32; 2] {
        self.wnd.size.get()
    }

    pub fn config(&self) -> WndConfig {
        self.wnd.config
    }

    /// Turn rendering off or back on for this window.
    pub fn set_skip_render(&self, skip: bool) {
        self.wnd.skip_render.set(skip);
    }

    // ---- input state, delegated to the router under the data lock ----

    pub fn set_focus(&self, ctrl: ControlRc) -> bool {
        let _guard = self.wnd.gfx.data_lock.enter();
        self.wnd.input.set_focus(ctrl)
    }

    pub fn kill_focus(&self) {
        let _guard = self.wnd.gfx.data_lock.enter();
        self.wnd.input.kill_focus()
    }

    pub fn set_capture(&self, ctrl: &ControlRc) {
        self.wnd.input.set_capture(ctrl)
    }

    pub fn release_capture(&self) -> bool {
        self.wnd.input.release_capture()
    }

    pub fn set_default(&self, ctrl: ControlRc) -> bool {
        let _guard = self.wnd.gfx.data_lock.enter();
        self.wnd.input.set_default(ctrl)
    }

    pub fn set_now_default(&self, ctrl: ControlRc) -> bool {
        let _guard = self.wnd.gfx.data_lock.enter();
        self.wnd.input.set_now_default(ctrl)
    }

    pub fn reset_default(&self) {
        let _guard = self.wnd.gfx.data_lock.enter();
        self.wnd.input.reset_now_default()
    }

    pub fn register_access_key(&self, ctrl: &ControlRc) -> Option<usize> {
        self.wnd.input.register_access_key(ctrl)
    }

    pub fn register_name(&self, name: &str, ctrl: &ControlRc) {
        self.wnd.names.borrow_mut().insert(name, ctrl)
    }

    pub fn find_named(&self, name: &str) -> Option<ControlRc> {
        self.wnd.names.borrow().get(name)
    }

    /// A control left the tree; null every reference to it or to its
    /// descendants.
    pub fn control_detached(&self, ctrl: &ControlRc) {
        let _guard = self.wnd.gfx.data_lock.enter();
        self.wnd.input.control_detached(ctrl);
        self.wnd.names.borrow_mut().control_detached(ctrl);
    }

    pub fn style_sheet(&self) -> Option<Rc<dyn StyleSheet>> {
        self.wnd.style_sheet.borrow().clone()
    }

    /// Swap the window's style sheet, returning the previous one, and
    /// invalidate everything.
    pub fn set_style_sheet(&self, sheet: Rc<dyn StyleSheet>) -> Option<Rc<dyn StyleSheet>> {
        let old = self.wnd.style_sheet.replace(Some(sheet));
        self.mark_full_redraw();
        old
    }

    /// Destroy the window and all of its children.
    pub fn destroy(&self) {
        // Children first, bottom-up.
        let children: Vec<HWnd> = self.wnd.children.borrow_mut().drain(..).collect();
        for child in children {
            child.destroy();
        }

        // Detach from the parent's child list. If we are the parent's open
        // popup, its slot must not try to close us again later.
        if let Some(parent) = self.wnd.parent.borrow().upgrade() {
            parent.children.borrow_mut().retain(|c| !Rc::ptr_eq(&c.wnd, &self.wnd));
            parent.popup.borrow_mut().forget(&HWnd {
                wnd: Rc::clone(&self.wnd),
            });
        }
        *self.wnd.parent.borrow_mut() = Weak::new();

        *self.wnd.style_sheet.borrow_mut() = None;

        let hwnd = self.wnd.hwnd.get();
        if hwnd.is_null() {
            return;
        }

        for i in 0..ACCESS_KEY_COUNT as i32 {
            unsafe {
                winuser::UnregisterHotKey(hwnd, i);
            }
        }
        unsafe {
            winuser::DestroyWindow(hwnd);
        }
        // `WM_NCDESTROY` clears the registry entry and the handle cell.
        self.wnd.bufs.borrow_mut().release();
    }
}

impl Wnd {
    pub(super) fn hwnd(&self) -> HWND {
        self.hwnd.get()
    }

    pub(super) fn viewport(&self) -> Rc<dyn Viewport> {
        Rc::clone(&self.viewport)
    }

    pub(super) fn clear_color(&self) -> RGBA<f32> {
        self.clear_color.get()
    }

    pub(super) fn client_size(&self) -> [u32; 2] {
        self.size.get()
    }

    pub(super) fn is_visible(&self) -> bool {
        let hwnd = self.hwnd.get();
        !hwnd.is_null() && unsafe { winuser::IsWindowVisible(hwnd) } != 0
    }

    pub(super) fn skip_render(&self) -> bool {
        self.skip_render.get()
    }

    /// Drop device-dependent resources ahead of a device recreation.
    pub(super) fn release_device_resources(&self) {
        self.bufs.borrow_mut().release();
        self.viewport.release_device();
    }

    /// A fresh device is in place; rebuild and repaint everything.
    pub(super) fn device_recreated(&self, gfx: &Gfx) {
        let _guard = gfx.data_lock.enter();
        self.viewport.recreate_device();
        self.dirty.borrow_mut().mark_full();
    }

    /// Commit a client-size change reported by the native queue. The
    /// swapchain resize is deferred to the next render.
    fn on_resize(&self, size: [u32; 2]) {
        if size[0] == 0 || size[1] == 0 || self.size.get() == size {
            return;
        }
        let _guard = self.gfx.data_lock.enter();
        self.size.set(size);
        self.dirty.borrow_mut().mark_full();
        self.viewport.window_resized(size);
    }

    /// Show live frame counters in the title. Debug builds only.
    #[cfg(debug_assertions)]
    pub(super) fn note_frame_presented(&self, full: bool) {
        let counter = if full {
            &self.dbg_full_frames
        } else {
            &self.dbg_partial_frames
        };
        counter.set(counter.get() + 1);

        let title = format!(
            "full: {} partial: {}",
            self.dbg_full_frames.get(),
            self.dbg_partial_frames.get()
        );
        let title = str_to_c_wstr(&title);
        unsafe {
            winuser::DefWindowProcW(
                self.hwnd.get(),
                winuser::WM_SETTEXT,
                0,
                title.as_ptr() as LPARAM,
            );
        }
    }

    #[cfg(not(debug_assertions))]
    pub(super) fn note_frame_presented(&self, _full: bool) {}

    fn route_mouse(&self, ev: &MouseInput) -> bool {
        let _guard = self.gfx.data_lock.enter();
        let root = Rc::clone(&self.viewport).as_control();
        self.input.route_mouse(ev, &root)
    }
}

/// Keep receiving `WM_MOUSELEAVE` for this window.
fn track_mouse_leave(hwnd: HWND) {
    let mut tme = winuser::TRACKMOUSEEVENT {
        cbSize: std::mem::size_of::<winuser::TRACKMOUSEEVENT>() as u32,
        dwFlags: winuser::TME_LEAVE,
        hwndTrack: hwnd,
        dwHoverTime: winuser::HOVER_DEFAULT,
    };
    unsafe {
        winuser::TrackMouseEvent(&mut tme);
    }
}

extern "system" fn wnd_proc(hwnd: HWND, msg: UINT, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if msg == winuser::WM_CREATE {
        // Adopt the window parked by `HWnd::new`.
        let wnd = WND_UNDER_CONSTRUCTION.with(|slot| slot.borrow_mut().take());
        if let Some(wnd) = wnd {
            wnd.hwnd.set(hwnd);
            WND_REGISTRY.with(|reg| {
                reg.borrow_mut().insert(hwnd as isize, wnd);
            });
        }
        return 0;
    }

    if msg == winuser::WM_NCDESTROY {
        if let Some(wnd) = WND_REGISTRY.with(|reg| reg.borrow_mut().remove(&(hwnd as isize))) {
            wnd.hwnd.set(null_mut());
            debug!("window {:?} destroyed", hwnd);
        }
        return unsafe { winuser::DefWindowProcW(hwnd, msg, wparam, lparam) };
    }

    let wnd = match wnd_by_hwnd(hwnd) {
        Some(wnd) => wnd,
        None => return unsafe { winuser::DefWindowProcW(hwnd, msg, wparam, lparam) },
    };

    do_msg(&wnd, hwnd, msg, wparam, lparam)
        .unwrap_or_else(|| unsafe { winuser::DefWindowProcW(hwnd, msg, wparam, lparam) })
}

/// Handle one message. `None` falls through to `DefWindowProcW`.
fn do_msg(wnd: &Rc<Wnd>, hwnd: HWND, msg: UINT, wparam: WPARAM, lparam: LPARAM) -> Option<LRESULT> {
    if msg == winuser::WM_MOUSELEAVE {
        let ev = MouseInput {
            kind: MouseEventKind::Leave,
            pos: Point2::new(-1.0, -1.0),
            wheel: 0.0,
            modifiers: Modifiers::empty(),
        };
        wnd.route_mouse(&ev);
        return Some(0);
    }

    if (winuser::WM_MOUSEFIRST..=winuser::WM_MOUSELAST).contains(&msg) {
        return Some(do_mouse_msg(wnd, hwnd, msg, wparam, lparam));
    }

    match msg {
        winuser::WM_SETCURSOR => {
            unsafe {
                winuser::SetCursor(wnd.cursor.get());
            }
            None
        }
        winuser::WM_ENTERSIZEMOVE => {
            wnd.moving_resizing.set(true);
            None
        }
        winuser::WM_EXITSIZEMOVE => {
            wnd.moving_resizing.set(false);
            let mut rect = MaybeUninit::uninit();
            assert_win32_ok(unsafe { winuser::GetClientRect(hwnd, rect.as_mut_ptr()) });
            let rect = unsafe { rect.assume_init() };
            wnd.on_resize([
                (rect.right - rect.left) as u32,
                (rect.bottom - rect.top) as u32,
            ]);
            None
        }
        winuser::WM_SETFOCUS => Some(0),
        winuser::WM_KILLFOCUS => {
            // A popup losing focus dismisses itself.
            if wnd.config.contains(WndConfig::POPUP) {
                unsafe {
                    winuser::PostMessageW(hwnd, winuser::WM_CLOSE, 0, 0);
                }
            }
            Some(0)
        }
        winuser::WM_SIZE => {
            if wparam == winuser::SIZE_MINIMIZED as WPARAM {
                return Some(0);
            }
            // Interactive resizes are committed once on `WM_EXITSIZEMOVE`.
            if wnd.moving_resizing.get() {
                return Some(0);
            }
            wnd.on_resize([
                u32::from(LOWORD(lparam as u32)),
                u32::from(HIWORD(lparam as u32)),
            ]);
            Some(1)
        }
        winuser::WM_KEYDOWN => {
            let _guard = wnd.gfx.data_lock.enter();
            wnd.input.on_key_down(Key(wparam as u16));
            Some(1)
        }
        winuser::WM_SYSKEYDOWN => {
            let repeat = lparam & (1 << 30) != 0;
            let _guard = wnd.gfx.data_lock.enter();
            wnd.input.on_system_key_down(Key(wparam as u16), repeat);
            Some(1)
        }
        winuser::WM_GETMINMAXINFO => {
            let info = lparam as *mut winuser::MINMAXINFO;
            unsafe {
                (*info).ptMinTrackSize.x += MIN_TRACK_PAD[0];
                (*info).ptMinTrackSize.y += MIN_TRACK_PAD[1];
            }
            Some(0)
        }
        winuser::WM_CHAR => {
            let _guard = wnd.gfx.data_lock.enter();
            wnd.input.on_char_unit(wparam as u16);
            Some(1)
        }
        winuser::WM_UNICHAR => {
            // `UNICHAR_NOCHAR` probes whether the message is understood.
            if wparam == winuser::UNICHAR_NOCHAR as WPARAM {
                return Some(1);
            }
            if let Some(c) = std::char::from_u32(wparam as u32) {
                let _guard = wnd.gfx.data_lock.enter();
                wnd.input.on_char(c);
            }
            Some(1)
        }
        winuser::WM_MOVING => {
            let rect = lparam as *const RECT;
            let (left, top) = unsafe { ((*rect).left, (*rect).top) };
            wnd.pos.set([left, top]);
            Some(1)
        }
        winuser::WM_CLOSE => {
            if wnd.viewport.close_requested() {
                let handle = HWnd { wnd: Rc::clone(wnd) };
                handle.destroy();
            }
            Some(0)
        }
        winuser::WM_MOUSEACTIVATE => Some(wnd.ma_return_code),
        winuser::WM_NCACTIVATE => {
            if LOWORD(wparam as u32) == winuser::WA_INACTIVE as u16 {
                let handle = HWnd { wnd: Rc::clone(wnd) };
                handle.close_popup();
            }
            None
        }
        winuser::WM_HOTKEY => {
            let fired = {
                let _guard = wnd.gfx.data_lock.enter();
                wnd.input.on_hot_key(wparam as usize)
            };
            if !fired {
                unsafe {
                    winuser::MessageBeep(0xFFFF_FFFF);
                }
            }
            None
        }
        _ => None,
    }
}

fn do_mouse_msg(wnd: &Rc<Wnd>, hwnd: HWND, msg: UINT, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    let mut kind = MOUSE_EVENT_MAP[(msg - winuser::WM_MOUSEFIRST) as usize];
    let modifiers = Modifiers::from_bits_truncate(wparam as u32);

    // Shift + vertical wheel scrolls horizontally.
    if msg == winuser::WM_MOUSEWHEEL && modifiers.contains(Modifiers::SHIFT) {
        kind = MouseEventKind::WheelH;
    }

    let pos = Point2::new(
        f32::from(LOWORD(lparam as u32) as i16),
        f32::from(HIWORD(lparam as u32) as i16),
    );

    let wheel = match kind {
        MouseEventKind::WheelV | MouseEventKind::WheelH => {
            f32::from(HIWORD(wparam as u32) as i16) / winuser::WHEEL_DELTA as f32
        }
        _ => 0.0,
    };

    match kind {
        MouseEventKind::Move => {
            track_mouse_leave(hwnd);
        }
        MouseEventKind::LButtonDown => {
            // A click on the owner dismisses its open popup and stops
            // there.
            let open = wnd.popup.borrow_mut().take();
            if let Some(popup) = open {
                popup.close();
                return 0;
            }
            unsafe {
                winuser::SetCapture(hwnd);
            }
        }
        _ => {}
    }

    let ev = MouseInput {
        kind,
        pos,
        wheel,
        modifiers,
    };
    let dispatched = wnd.route_mouse(&ev);

    if kind == MouseEventKind::LButtonUp && dispatched {
        unsafe {
            winuser::ReleaseCapture();
        }
    }

    0
}
