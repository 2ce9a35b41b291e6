//! The Windows backend: native windows, the Direct3D 11 / Direct2D
//! device pair, flip-model swapchains with dirty-rect presentation, and
//! the message loop.
mod codecvt;
mod eventloop;
mod framebuf;
mod gfx;
mod render;
mod utils;
mod window;

pub use self::{
    eventloop::{enter_main_loop, terminate},
    gfx::{Gfx, UiLock, UiLockGuard, Viewport},
    utils::{ComPtr, GfxError, GfxResult, Object},
    window::{HWnd, WndOptions},
};
