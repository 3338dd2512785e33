pub mod category;
pub mod error;
pub mod flashcard;

pub use category::Category;
pub use error::{
    CardforgeError, ProviderError, ProviderErrorKind, Result, ResultExt,
};
pub use flashcard::{FlashcardItem, FlashcardSet, GenerationPayload, fold_unique};
