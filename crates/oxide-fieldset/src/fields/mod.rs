//! Built-in field kinds.

mod choice;
mod file;
mod number;
mod temporal;
mod text;

pub use choice::{ChoiceField, MultiChoiceField, VocabularyFactory, VocabularySource, NO_VALUE_TOKEN};
pub use file::FileField;
pub use number::{DecimalField, FloatField, IntegerField};
pub use temporal::{DateField, DateTimeField};
pub use text::{LinesField, PasswordField, TextAreaField, TextField};
