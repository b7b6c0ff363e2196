#![doc(html_root_url = "https://docs.rs/conform/0.1.0")]
#![warn(clippy::pedantic)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod binder;
pub mod dispatch;
pub mod load;
pub mod memory;
pub mod projector;
pub mod relay;
pub mod session;
pub mod store;
pub mod subject;
pub mod surface;
mod temp_set;
