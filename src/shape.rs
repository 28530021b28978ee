//! Runtime type metadata consumed by the schema generator.
//!
//! Rust has no runtime reflection, so every type that appears in a request or
//! response model describes itself through the [`Reflect`] trait. The returned
//! [`Shape`] carries the type identity (`TypeId` plus fully-qualified name) and
//! one of a closed set of kinds. Nested shapes are stored as `fn() -> Shape`
//! so that self-referential types can describe themselves without building
//! infinite metadata.
//!
//! # Example
//!
//! ```
//! use openapi_synth::shape::{FieldDef, Reflect, Shape};
//!
//! pub struct Topic {
//!     pub namespace: String,
//!     pub view_count: i64,
//!     pub parent: Option<Box<Topic>>,
//! }
//!
//! impl Reflect for Topic {
//!     fn shape() -> Shape {
//!         Shape::structure::<Self>(vec![
//!             FieldDef::new::<String>("namespace"),
//!             FieldDef::new::<i64>("view_count").rename("viewCount"),
//!             FieldDef::new::<Option<Box<Topic>>>("parent"),
//!         ])
//!     }
//! }
//!
//! assert!(Topic::shape().is_struct());
//! ```

use std::any::{type_name, TypeId};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::sync::mpsc::{Receiver, Sender, SyncSender};
use std::sync::Arc;

/// Lazily evaluated nested shape
pub type ShapeFn = fn() -> Shape;

/// Types that can describe their own structure.
pub trait Reflect: 'static {
    /// Returns the runtime metadata for this type
    fn shape() -> Shape;
}

/// Runtime type metadata
#[derive(Debug, Clone)]
pub struct Shape {
    /// Structural identity of the type
    pub id: TypeId,
    /// Fully-qualified type name (module path and generic arguments included)
    pub type_name: &'static str,
    /// The kind of type
    pub kind: TypeKind,
}

/// Type kind - the closed set of shapes the generator understands
#[derive(Debug, Clone)]
pub enum TypeKind {
    /// A primitive type (String, i32, etc.)
    Primitive(PrimitiveType),
    /// `Option<T>`: transparent, but makes the containing field non-required
    Option(ShapeFn),
    /// `Box<T>`, `Rc<T>`, `Arc<T>`, `&T`: fully transparent. Fields of these
    /// types stay required since Rust pointers are never null.
    Pointer(ShapeFn),
    /// Homogeneous collections
    Seq(ShapeFn),
    /// String-keyed maps, carrying the value shape
    Map(ShapeFn),
    /// A struct type with named fields
    Struct(StructDef),
    /// `()`, used for bodiless responses
    Unit,
    /// Kinds with no schema representation
    Unsupported(UnsupportedKind),
}

/// Primitive types supported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    String,
    I8,
    I16,
    I32,
    I64,
    I128,
    U8,
    U16,
    U32,
    U64,
    U128,
    F32,
    F64,
    Bool,
    Char,
}

/// Kinds rejected by the generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedKind {
    Function,
    Channel,
    RawPointer,
}

impl std::fmt::Display for UnsupportedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            UnsupportedKind::Function => write!(f, "function"),
            UnsupportedKind::Channel => write!(f, "channel"),
            UnsupportedKind::RawPointer => write!(f, "raw pointer"),
        }
    }
}

/// Struct definition with fields
#[derive(Debug, Clone)]
pub struct StructDef {
    /// The fields of the struct, in declaration order
    pub fields: Vec<FieldDef>,
}

/// Field definition in a struct
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Field name as declared in Rust
    pub name: String,
    /// Shape of the field type
    pub shape: ShapeFn,
    /// Serde-style attributes applied to this field
    pub attrs: FieldAttributes,
}

/// Serde-style attributes for a field
#[derive(Debug, Clone, Default)]
pub struct FieldAttributes {
    /// Renamed field name
    pub rename: Option<String>,
    /// Whether to leave this field out of the schema
    pub skip: bool,
    /// Whether the field may be absent even if its type is not an `Option`
    pub optional: bool,
    /// Whether to merge the field's own fields into the parent object
    pub flatten: bool,
}

impl Shape {
    /// Metadata for `T`
    pub fn of<T: Reflect + ?Sized>() -> Shape {
        T::shape()
    }

    /// Create a shape of the given kind for type `T`
    pub fn new<T: ?Sized + 'static>(kind: TypeKind) -> Shape {
        Shape {
            id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            kind,
        }
    }

    /// Create a struct shape for type `T`
    pub fn structure<T: ?Sized + 'static>(fields: Vec<FieldDef>) -> Shape {
        Shape::new::<T>(TypeKind::Struct(StructDef { fields }))
    }

    /// Whether this shape becomes a named component
    pub fn is_struct(&self) -> bool {
        matches!(self.kind, TypeKind::Struct(_))
    }
}

impl FieldDef {
    /// Create a field of type `T`
    pub fn new<T: Reflect + ?Sized>(name: &str) -> Self {
        Self {
            name: name.to_string(),
            shape: <T as Reflect>::shape,
            attrs: FieldAttributes::default(),
        }
    }

    pub fn rename(mut self, name: &str) -> Self {
        self.attrs.rename = Some(name.to_string());
        self
    }

    pub fn skip(mut self) -> Self {
        self.attrs.skip = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.attrs.optional = true;
        self
    }

    pub fn flatten(mut self) -> Self {
        self.attrs.flatten = true;
        self
    }

    /// The property name used in the schema
    pub fn serialized_name(&self) -> &str {
        self.attrs.rename.as_deref().unwrap_or(&self.name)
    }
}

macro_rules! impl_primitive {
    ($($ty:ty => $prim:ident),* $(,)?) => {
        $(
            impl Reflect for $ty {
                fn shape() -> Shape {
                    Shape::new::<$ty>(TypeKind::Primitive(PrimitiveType::$prim))
                }
            }
        )*
    };
}

impl_primitive! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    i128 => I128,
    isize => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    u128 => U128,
    usize => U64,
    f32 => F32,
    f64 => F64,
    char => Char,
    String => String,
    str => String,
}

impl Reflect for () {
    fn shape() -> Shape {
        Shape::new::<()>(TypeKind::Unit)
    }
}

impl<T: Reflect> Reflect for Option<T> {
    fn shape() -> Shape {
        Shape::new::<Self>(TypeKind::Option(T::shape))
    }
}

macro_rules! impl_pointer {
    ($($ty:ident),*) => {
        $(
            impl<T: Reflect + ?Sized> Reflect for $ty<T> {
                fn shape() -> Shape {
                    Shape::new::<Self>(TypeKind::Pointer(<T as Reflect>::shape))
                }
            }
        )*
    };
}

impl_pointer!(Box, Rc, Arc);

impl<T: Reflect + ?Sized> Reflect for &'static T {
    fn shape() -> Shape {
        Shape::new::<Self>(TypeKind::Pointer(<T as Reflect>::shape))
    }
}

macro_rules! impl_seq {
    ($($ty:ident),*) => {
        $(
            impl<T: Reflect> Reflect for $ty<T> {
                fn shape() -> Shape {
                    Shape::new::<Self>(TypeKind::Seq(T::shape))
                }
            }
        )*
    };
}

impl_seq!(Vec, VecDeque, BTreeSet);

impl<T: Reflect, S: 'static> Reflect for HashSet<T, S> {
    fn shape() -> Shape {
        Shape::new::<Self>(TypeKind::Seq(T::shape))
    }
}

impl<T: Reflect> Reflect for [T] {
    fn shape() -> Shape {
        Shape::new::<Self>(TypeKind::Seq(T::shape))
    }
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    fn shape() -> Shape {
        Shape::new::<Self>(TypeKind::Seq(T::shape))
    }
}

impl<V: Reflect, S: 'static> Reflect for HashMap<String, V, S> {
    fn shape() -> Shape {
        Shape::new::<Self>(TypeKind::Map(V::shape))
    }
}

impl<V: Reflect> Reflect for BTreeMap<String, V> {
    fn shape() -> Shape {
        Shape::new::<Self>(TypeKind::Map(V::shape))
    }
}

impl<T: ?Sized + 'static> Reflect for *const T {
    fn shape() -> Shape {
        Shape::new::<Self>(TypeKind::Unsupported(UnsupportedKind::RawPointer))
    }
}

impl<T: ?Sized + 'static> Reflect for *mut T {
    fn shape() -> Shape {
        Shape::new::<Self>(TypeKind::Unsupported(UnsupportedKind::RawPointer))
    }
}

impl<R: 'static> Reflect for fn() -> R {
    fn shape() -> Shape {
        Shape::new::<Self>(TypeKind::Unsupported(UnsupportedKind::Function))
    }
}

impl<A: 'static, R: 'static> Reflect for fn(A) -> R {
    fn shape() -> Shape {
        Shape::new::<Self>(TypeKind::Unsupported(UnsupportedKind::Function))
    }
}

impl<A: 'static, B: 'static, R: 'static> Reflect for fn(A, B) -> R {
    fn shape() -> Shape {
        Shape::new::<Self>(TypeKind::Unsupported(UnsupportedKind::Function))
    }
}

impl<R: 'static> Reflect for dyn Fn() -> R {
    fn shape() -> Shape {
        Shape::new::<Self>(TypeKind::Unsupported(UnsupportedKind::Function))
    }
}

impl<A: 'static, R: 'static> Reflect for dyn Fn(A) -> R {
    fn shape() -> Shape {
        Shape::new::<Self>(TypeKind::Unsupported(UnsupportedKind::Function))
    }
}

macro_rules! impl_channel {
    ($($ty:ident),*) => {
        $(
            impl<T: 'static> Reflect for $ty<T> {
                fn shape() -> Shape {
                    Shape::new::<Self>(TypeKind::Unsupported(UnsupportedKind::Channel))
                }
            }
        )*
    };
}

impl_channel!(Sender, SyncSender, Receiver);
