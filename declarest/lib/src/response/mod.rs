//! Response processing.
//!
//! A decoded body is flattened, folded through the node's transform pipeline
//! (flattened again after every processor), and finally tabularized:
//!
//! ```text
//! raw body -> Decoder -> flatten -> [processor -> flatten]* -> tabularize
//! ```

mod decode;
mod flatten;
mod process;
mod table;
mod tabularize;
mod transform;
mod value;

pub use decode::{BodyFormat, Decoder, JsonDecoder, XmlDecoder, YamlDecoder};
pub use flatten::{SEPARATOR, flatten, flatten_map, is_flat};
pub use process::{RawResponse, error_message, process_response, process_value};
pub use table::{DataTable, Row};
pub use tabularize::tabularize;
pub use transform::{KeyMatcher, Processor, TransformPipeline};
pub use value::ResponseValue;
