//! Pipeline stages for both directions.
//!
//! Each submodule implements exactly one transformation step, so each is
//! testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! extraction:  input ──▶ records ──▶ flatten ──▶ csv_out
//!             (read/DL)  (shapes)    (keys)      (sorted header)
//!
//! rendering:   input ──▶ table ──▶ compose ──▶ layout ──▶ pdf
//!             (URL/path) (CSV)    (fields,    (pages,    (lopdf)
//!                                  title)      wrapping)
//! ```
//!
//! 1. [`input`]  : read local files, fetch CSV URLs, download Drive files
//! 2. [`records`]: locate rows inside a JSON document by shape
//! 3. [`flatten`]: nested objects to `parent_child` keys
//! 4. [`csv_out`]: write records with a sorted-union header
//! 5. [`table`]  : parse CSV text into a position-addressed dataset
//! 6. [`compose`]: turn one row into label/value fields on pages
//! 7. [`layout`] : cursor-based cell layout with automatic page breaks
//! 8. [`pdf`]    : assemble pages, fonts and the signature into a PDF
//!
//! Helpers: [`filename`] (sanitizing and de-duplicating output names),
//! [`fonts`] (Helvetica metrics, WinAnsi encoding) and [`text_repair`]
//! (mojibake and punctuation cleanup).

pub mod compose;
pub mod csv_out;
pub mod filename;
pub mod flatten;
pub mod fonts;
pub mod input;
pub mod layout;
pub mod pdf;
pub mod records;
pub mod table;
pub mod text_repair;
