pub mod block;
pub mod book_script;
pub mod character;

pub use block::{
    Block, BlockElement, MultiBlockQuote, ReferenceBlock, SecondaryReference, UNSPLIT,
};
pub use book_script::BookScript;
pub use character::{CharacterId, StandardRole};
