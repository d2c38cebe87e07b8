pub mod config;
pub mod nonstandard;

pub mod phase0 {
    pub mod consts;
    pub mod containers;
    pub mod primitives;
}
