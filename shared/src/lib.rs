#![no_std]

pub mod io;
pub mod sys;
