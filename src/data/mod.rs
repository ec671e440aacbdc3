//! Static data tables shared by the emitter, parser and calculator.

pub mod maps;
