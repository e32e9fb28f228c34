pub mod compositor;
pub mod frm;
pub mod palette;

pub mod prelude {
    pub use crate::sprite::compositor::*;
    pub use crate::sprite::frm::*;
    pub use crate::sprite::palette::*;
}
