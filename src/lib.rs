//! Conformal: structural interface contracts for dynamic values
//!
//! Named capability contracts for a dynamically-typed object model:
//! declare an interface spec once, verify targets against it at composition
//! time, optionally rewrite their capabilities into per-call validating
//! wrappers, and merge reusable trait bundles into them with explicit
//! conflict resolution.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                  Conformal                   │
//! │                                              │
//! │  spec     - interface specs and descriptors  │
//! │  runtime  - capability surfaces, verifier    │
//! │  compose  - trait bundles and instantiation  │
//! │                                              │
//! ├──────────────────────────────────────────────┤
//! │     host object system (out of scope)        │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use conformal::runtime::verify::{adopt, AdoptOptions};
//! use conformal::runtime::Surface;
//! use conformal::spec::{InterfaceSpec, TypeDescriptor};
//! use conformal::{TypeTag, Value};
//!
//! let int = || TypeDescriptor::concrete(TypeTag::Int);
//! let adder = InterfaceSpec::builder("Adder")
//!     .proto("sum", [TypeDescriptor::sequence_of(int())], Some(int()))
//!     .build()
//!     .unwrap();
//!
//! let mut calculator = Surface::builder("Calculator")
//!     .public_fn("sum", 1, |_, args| {
//!         let items = args[0].as_seq().unwrap_or(&[]);
//!         Ok(Value::Int(items.iter().filter_map(Value::as_int).sum()))
//!     })
//!     .build();
//!
//! adopt(&mut calculator, &adder, AdoptOptions::default()).unwrap();
//! let three = calculator
//!     .invoke("sum", &[Value::Seq(vec![Value::Int(1), Value::Int(2)])])
//!     .unwrap();
//! assert_eq!(three, Value::Int(3));
//! ```

pub mod compose;
pub mod config;
pub mod error;
pub mod runtime;
pub mod spec;
pub mod value;

pub use compose::{compose, CompositionPlan, TraitBundle};
pub use config::{check_interface, check_type, set_typecheck_enabled, typecheck_enabled};
pub use error::{CallContext, ContractError, ValueSite};
pub use runtime::verify::{adopt, cast_as, shell, verify, verify_value, AdoptOptions};
pub use runtime::Surface;
pub use spec::{InterfaceSpec, Requirement, Signature, TypeDescriptor};
pub use value::{TypeTag, Value};
