//! A forward-only YAML 1.2 reader and a matching writer that keep byte-offset
//! span information for every token.
//!
//! The [`Reader`] pulls tokens out of a borrowed byte buffer without building
//! a document tree. Scalars are located during scanning but only decoded when
//! asked for, borrowing from the input whenever no folding or escape
//! processing is needed. The [`Writer`] turns structural and scalar write calls
//! back into YAML text.
//!
//! # Examples
//!
//! ```
//! use yaml_spanner::{CollectionStyle, Error, Reader, ReaderOptions, TokenType, Writer};
//!
//! let input = b"name: Jane Smith\ntags:\n  - designer\n";
//! let mut reader = Reader::new(input, ReaderOptions::default());
//! let mut writer = Writer::new(Vec::new());
//!
//! while reader.read()? {
//!     match reader.token_type() {
//!         TokenType::MappingStart => writer.write_mapping_start(CollectionStyle::Block),
//!         TokenType::MappingEnd => writer.write_mapping_end(),
//!         TokenType::SequenceStart => writer.write_sequence_start(CollectionStyle::Block),
//!         TokenType::SequenceEnd => writer.write_sequence_end(),
//!         TokenType::Scalar if reader.is_mapping_key() => {
//!             writer.write_property_name(&reader.get_string()?)
//!         }
//!         TokenType::Scalar => writer.write_string(&reader.get_string()?),
//!         _ => {}
//!     }
//! }
//!
//! let output = writer.into_inner().unwrap();
//! assert_eq!(output, input);
//! # Ok::<(), Error>(())
//! ```

mod error;
mod queue;
mod reader;
mod scalar;
mod scanner;
mod simple_key;
mod span;
mod tags;
mod token;
#[cfg(feature = "write")]
mod writer;

pub use error::{Error, ErrorCategory, ErrorKind};
pub use reader::{ParserState, Reader, ReaderOptions, ReaderState};
pub use scalar::ScalarValue;
pub use span::{Mark, Span};
pub use tags::{CORE_SCHEMA_PREFIX, MAX_TAG_HANDLES};
pub use token::{Chomping, CollectionStyle, ScalarStyle, TokenType};
#[cfg(feature = "write")]
pub use writer::{ContainerInfo, ContainerKind, Writer, WriterOptions, WriterState};
