//! Binary serialization for doubly-linked lists whose nodes carry one
//! arbitrary cross-reference ("rand" pointer) to any node in the same list.
//!
//! ```
//! use randlist::List;
//!
//! let mut list: List = ["a", "b", "c"].into_iter().collect();
//! list.set_cross(0, 2);
//! list.set_cross(2, 2);
//!
//! let bytes = list.to_bytes()?;
//! let copy = List::from_bytes(&bytes)?;
//! assert_eq!(copy.get(0).unwrap().cross().unwrap().payload(), b"c");
//! # Ok::<(), randlist::CodecError>(())
//! ```

pub mod index;
pub mod list;
pub mod record;
pub mod codec;

pub use list::{List, NodeRef, ListSnapshot, NodeSnapshot};
pub use codec::{CodecError, DecodeOptions, encode, decode, decode_with};
pub use index::NO_CROSS;
