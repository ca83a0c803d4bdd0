//! Join point kinds.
//!
//! The external engine reports the kind of each interception as an integer
//! code. This module maps those codes onto the portable [`Kind`] taxonomy.
//!
//! # Taxonomy
//!
//! A portable kind is a composition of flags: one moment (`AROUND`,
//! `BEFORE`, `AFTER`), an optional target (`METHOD`, `FUNCTION`,
//! `PROPERTY` with `READ`/`WRITE`), and for after-advice on methods and
//! functions an optional outcome (`RETURN`, `THROW`). Only the compositions
//! listed in [`Kind`] are valid.

use tracing::warn;

use crate::error::{Result, WeaveError};

/// Portable kind flags.
pub mod flags {
    pub const AROUND: u32 = 1;
    pub const BEFORE: u32 = 2;
    pub const AFTER: u32 = 4;
    pub const READ: u32 = 8;
    pub const WRITE: u32 = 16;
    pub const PROPERTY: u32 = 32;
    pub const METHOD: u32 = 64;
    pub const FUNCTION: u32 = 128;
    pub const THROW: u32 = 256;
    pub const RETURN: u32 = 512;
}

/// Kind codes emitted by the external weaving engine.
pub mod engine_codes {
    pub const BEFORE: u32 = 2;
    pub const AFTER: u32 = 4;
    pub const AROUND: u32 = 1;

    pub const PROPERTY: u32 = 32;
    pub const FUNCTION: u32 = 128;
    pub const METHOD: u32 = 64;
    pub const READ: u32 = 8;
    pub const WRITE: u32 = 16;

    pub const AROUND_WRITE_PROPERTY: u32 = 49;
    pub const AROUND_READ_PROPERTY: u32 = 41;
    pub const BEFORE_WRITE_PROPERTY: u32 = 50;
    pub const BEFORE_READ_PROPERTY: u32 = 42;
    pub const AFTER_WRITE_PROPERTY: u32 = 52;
    pub const AFTER_READ_PROPERTY: u32 = 44;

    pub const BEFORE_METHOD: u32 = 66;
    pub const AFTER_METHOD: u32 = 68;
    pub const AROUND_METHOD: u32 = 65;

    pub const BEFORE_FUNCTION: u32 = 130;
    pub const AFTER_FUNCTION: u32 = 132;
    pub const AROUND_FUNCTION: u32 = 129;
}

use flags::*;

/// Normalized kind of a join point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Kind {
    Before = BEFORE,
    After = AFTER,
    Around = AROUND,

    Property = PROPERTY,
    Function = FUNCTION,
    Method = METHOD,
    Read = READ,
    Write = WRITE,

    BeforePropertyRead = BEFORE | PROPERTY | READ,
    BeforePropertyWrite = BEFORE | PROPERTY | WRITE,
    AfterPropertyRead = AFTER | PROPERTY | READ,
    AfterPropertyWrite = AFTER | PROPERTY | WRITE,
    AroundPropertyRead = AROUND | PROPERTY | READ,
    AroundPropertyWrite = AROUND | PROPERTY | WRITE,

    BeforeMethod = BEFORE | METHOD,
    AfterMethod = AFTER | METHOD,
    AfterMethodReturn = AFTER | METHOD | RETURN,
    AfterMethodThrow = AFTER | METHOD | THROW,
    AroundMethod = AROUND | METHOD,

    BeforeFunction = BEFORE | FUNCTION,
    AfterFunction = AFTER | FUNCTION,
    AfterFunctionReturn = AFTER | FUNCTION | RETURN,
    AfterFunctionThrow = AFTER | FUNCTION | THROW,
    AroundFunction = AROUND | FUNCTION,
}

impl Kind {
    /// Every valid kind.
    pub const ALL: [Kind; 24] = [
        Kind::Before,
        Kind::After,
        Kind::Around,
        Kind::Property,
        Kind::Function,
        Kind::Method,
        Kind::Read,
        Kind::Write,
        Kind::BeforePropertyRead,
        Kind::BeforePropertyWrite,
        Kind::AfterPropertyRead,
        Kind::AfterPropertyWrite,
        Kind::AroundPropertyRead,
        Kind::AroundPropertyWrite,
        Kind::BeforeMethod,
        Kind::AfterMethod,
        Kind::AfterMethodReturn,
        Kind::AfterMethodThrow,
        Kind::AroundMethod,
        Kind::BeforeFunction,
        Kind::AfterFunction,
        Kind::AfterFunctionReturn,
        Kind::AfterFunctionThrow,
        Kind::AroundFunction,
    ];

    /// Flag composition of this kind.
    pub fn bits(self) -> u32 {
        self as u32
    }

    /// Validity check of the taxonomy: returns the kind whose flag
    /// composition is exactly `bits`.
    pub fn from_bits(bits: u32) -> Option<Kind> {
        Self::ALL.iter().copied().find(|k| k.bits() == bits)
    }

    fn has(self, flag: u32) -> bool {
        self.bits() & flag == flag
    }

    pub fn is_before(self) -> bool {
        self.has(BEFORE)
    }

    pub fn is_after(self) -> bool {
        self.has(AFTER)
    }

    pub fn is_around(self) -> bool {
        self.has(AROUND)
    }

    pub fn is_method(self) -> bool {
        self.has(METHOD)
    }

    pub fn is_function(self) -> bool {
        self.has(FUNCTION)
    }

    pub fn is_property(self) -> bool {
        self.has(PROPERTY)
    }

    pub fn is_read(self) -> bool {
        self.has(READ)
    }

    pub fn is_write(self) -> bool {
        self.has(WRITE)
    }

    pub fn is_return(self) -> bool {
        self.has(RETURN)
    }

    pub fn is_throw(self) -> bool {
        self.has(THROW)
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Engine code to portable kind.
///
/// The trailing entries are codes the engine emits without documenting
/// them. They are kept verbatim; do not derive them from flags.
pub const KIND_TABLE: &[(u32, Kind)] = &[
    (engine_codes::BEFORE, Kind::Before),
    (engine_codes::AFTER, Kind::After),
    (engine_codes::AROUND, Kind::Around),
    (engine_codes::PROPERTY, Kind::Property),
    (engine_codes::FUNCTION, Kind::Function),
    (engine_codes::METHOD, Kind::Method),
    (engine_codes::READ, Kind::Read),
    (engine_codes::WRITE, Kind::Write),
    (engine_codes::AROUND_WRITE_PROPERTY, Kind::AroundPropertyWrite),
    (engine_codes::AROUND_READ_PROPERTY, Kind::AroundPropertyRead),
    (engine_codes::BEFORE_WRITE_PROPERTY, Kind::BeforePropertyWrite),
    (engine_codes::BEFORE_READ_PROPERTY, Kind::BeforePropertyRead),
    (engine_codes::AFTER_WRITE_PROPERTY, Kind::AfterPropertyWrite),
    (engine_codes::AFTER_READ_PROPERTY, Kind::AfterPropertyRead),
    (engine_codes::BEFORE_METHOD, Kind::BeforeMethod),
    (engine_codes::AFTER_METHOD, Kind::AfterMethod),
    (engine_codes::AROUND_METHOD, Kind::AroundMethod),
    (engine_codes::BEFORE_FUNCTION, Kind::BeforeFunction),
    (engine_codes::AFTER_FUNCTION, Kind::AfterFunction),
    (engine_codes::AROUND_FUNCTION, Kind::AroundFunction),
    // undocumented engine codes
    (836, Kind::AfterMethod),
    (580, Kind::AfterMethodReturn),
    (324, Kind::AfterMethodThrow),
    (900, Kind::AfterFunction),
    (644, Kind::AfterFunctionReturn),
    (388, Kind::AfterFunctionThrow),
    (820, Kind::AfterPropertyWrite),
    (812, Kind::AfterPropertyRead),
];

/// Resolves engine kind codes against a fixed table.
#[derive(Debug, Clone, Copy)]
pub struct KindResolver {
    table: &'static [(u32, Kind)],
}

impl KindResolver {
    /// Create a resolver over a custom table.
    pub const fn with_table(table: &'static [(u32, Kind)]) -> Self {
        Self { table }
    }

    /// Entries of the table, in declaration order.
    pub fn table(&self) -> &'static [(u32, Kind)] {
        self.table
    }

    /// Resolve an engine kind code to a portable kind.
    ///
    /// Fails with [`WeaveError::Kind`] when the code is not in the table.
    /// Table entries are `Kind` values, so every hit is a valid composition.
    pub fn resolve(&self, raw: u32) -> Result<Kind> {
        let kind = self
            .table
            .iter()
            .find(|(code, _)| *code == raw)
            .map(|(_, kind)| *kind);

        kind.ok_or_else(|| {
            warn!(code = raw, "Unknown join point kind");
            WeaveError::Kind(raw)
        })
    }
}

impl Default for KindResolver {
    fn default() -> Self {
        Self::with_table(KIND_TABLE)
    }
}

/// Resolve an engine kind code with the default table.
pub fn resolve(raw: u32) -> Result<Kind> {
    KindResolver::default().resolve(raw)
}
