//! IM (instant messaging) side of the relay: Telegram today.
//! All teloxide usage stays in `telegram`; the pipeline sees only the `transport`
//! traits (attachment in, reply out).

pub mod log;
pub mod telegram;
pub mod transport;
