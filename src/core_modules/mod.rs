pub mod canvas;
pub mod mutation;
pub mod palette;
pub mod pixel;
pub mod scorer;
pub mod utils;
