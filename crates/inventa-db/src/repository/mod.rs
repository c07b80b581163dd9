//! # Repository Module
//!
//! Database repository implementations for Inventa.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repositories and the Ledger                          │
//! │                                                                         │
//! │  Caller                                                                │
//! │       │  db.products().create(..)         db.ledger().create_sale(..)   │
//! │       ▼                                        │                        │
//! │  CategoryRepository / SupplierRepository       │ one transaction        │
//! │  ProductRepository (catalog + stock helpers)   ▼                        │
//! │  SaleRepository / ReturnRepository (reads) ◄── pub(crate) row fns      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CategoryRepository`] - Category CRUD
//! - [`SupplierRepository`] - Supplier CRUD
//! - [`ProductRepository`] - Product CRUD, stock adjustment, low stock
//! - [`SaleRepository`] - Sale reads
//! - [`ReturnRepository`] - Return reads

pub mod category;
pub mod product;
pub mod returns;
pub mod sale;
pub mod supplier;

pub use category::CategoryRepository;
pub use product::ProductRepository;
pub use returns::ReturnRepository;
pub use sale::SaleRepository;
pub use supplier::SupplierRepository;
