//! The UI thread's message loop.
use std::{mem, ptr::null_mut};
use winapi::um::{dwmapi::DwmFlush, winuser};

use super::gfx::Gfx;

/// Run the message loop until [`terminate`] is called.
///
/// Each iteration drains the pending native messages, renders the windows
/// that accumulated damage, and then blocks on `DwmFlush` so frames pace
/// to the compositor's vertical blank instead of spinning.
pub fn enter_main_loop() {
    let gfx = Gfx::global();

    let mut msg: winuser::MSG = unsafe { mem::zeroed() };
    loop {
        unsafe {
            while winuser::PeekMessageW(&mut msg, null_mut(), 0, 0, winuser::PM_REMOVE) != 0 {
                if msg.message == winuser::WM_QUIT {
                    return;
                }
                winuser::TranslateMessage(&msg);
                winuser::DispatchMessageW(&msg);
            }
        }

        gfx.run_frame();

        unsafe {
            DwmFlush();
        }
    }
}

/// Ask the message loop to exit after the current iteration.
pub fn terminate() {
    unsafe {
        winuser::PostQuitMessage(0);
    }
}
