mod buffer;
mod debounce;

pub(crate) use buffer::{AutosavePolicy, Field, PageEditBuffer, PageSink};
pub(crate) use debounce::WindowTimers;
