pub mod axes;
pub mod polynomial;
pub mod store;

pub use axes::{Bracket, GridAxes};
pub use polynomial::Polynomial;
pub use store::{GridNode, GridRow, GridStore};
