//! # Events Module
//!
//! Event-driven progress reporting for any presentation shell.
//!
//! ## Design
//! The organizer emits events through channels, allowing any UI
//! (CLI, GUI, web) to subscribe and display progress. The core never
//! references a widget.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         match event {
//!             Event::Run(RunEvent::OverallProgress { processed, total }) => {
//!                 println!("{}/{}", processed, total)
//!             }
//!             Event::File(FileEvent::Progress(p)) => println!("{} {:.0}%", p.name, p.percent),
//!             _ => {}
//!         }
//!     }
//! });
//!
//! organizer.run_with_events(&sender)?;
//! ```

mod channel;
mod types;

pub use channel::{EventChannel, EventReceiver, EventSender, null_sender};
pub use types::*;
