//! PicBed core: configuration, transient artifact store, upload client, reply
//! formatting, and the upload-and-respond pipeline. No binary entry points here.

pub mod config;
pub mod im;
pub mod pipeline;
pub mod reply;
pub mod store;
pub mod upload;
