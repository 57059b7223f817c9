mod engine;
mod kind;
mod pending;
mod settled;

pub use {engine::*, kind::*, pending::*, settled::*};
