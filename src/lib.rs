//! # foldpdf
//!
//! Binds a folder of PDFs and images into a single PDF whose outline
//! (bookmarks) mirrors the folder hierarchy. Your filesystem is the table of
//! contents: folders become outline sections, files become pages, and a few
//! dotfiles inside a folder adjust titles, labels, order and resolution.
//!
//! # Architecture: Compile Pipeline
//!
//! ```text
//! 1. Select       root/    →  ordered paths     (traversal + marker files + filters)
//! 2. Describe     paths    →  entries           (titles, labels, image-only flag)
//! 3. Materialize  entries  →  pages             (lopdf load / image render, parallel)
//! 4. Assemble     entries  →  positions+outline (two-pass pagination, outline tree)
//! 5. Write        pages    →  output.pdf        (page copy, bookmarks, metadata)
//! ```
//!
//! Stages 1, 2 and 4 are pure functions of their input once the directory has
//! been read, so they are tested without any PDF machinery. Stages 3 and 5
//! sit behind the [`materialize::PageMaterializer`] and
//! [`writer::DocumentWriter`] traits, which tests replace with recording
//! mocks.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`markers`] | Per-folder marker files: `.ignore`, `.title`, `.order`, `.label`, `.dpi` |
//! | [`select`] | Stage 1: depth-first traversal, ordering, include/exclude patterns |
//! | [`describe`] | Stage 2: typed [`describe::Entry`] values for selected paths |
//! | [`materialize`] | Stage 3: `PageMaterializer` trait and the lopdf/image implementation |
//! | [`imaging`] | Image decoding, page canvas geometry, single-page PDF rendering |
//! | [`assemble`] | Stage 4: start pages, empty-folder backfill, outline tree |
//! | [`naming`] | Outline titles: labels and prettified base names |
//! | [`writer`] | Stage 5: `DocumentWriter` trait and the lopdf implementation |
//! | [`compile`] | Runs the stages end to end; dry-run [`compile::plan`] |
//! | [`config`] | `foldpdf.toml` loading, validation and command-line overrides |
//! | [`output`] | CLI output formatting: plan listing, outline tree, summary |
//! | [`logging`] | `tracing` subscriber setup |
//!
//! # Design Decisions
//!
//! ## Deterministic Order
//!
//! Children named in a folder's `.order` file come first, in that order;
//! everything else follows by case-insensitive name with the exact name as
//! the final tie-break. Two compiles of the same tree always produce the same
//! document, whatever order the filesystem lists entries in.
//!
//! ## Flat Entries, Path-Keyed Parents
//!
//! The tree is never materialised as linked nodes. Entries live in one `Vec`
//! in pre-order and the outline is a flat arena whose nodes refer to their
//! parent by index. The folder → outline node association used while building
//! it is a local map keyed by folder path.
//!
//! ## Failures Stay Local
//!
//! An unreadable file contributes zero pages and no outline item; a rejected
//! outline item loses only itself. Only an unreadable root, an invalid
//! pattern or config, and a failed write stop a compile.
//!
//! ## Pure-Rust PDF Handling
//!
//! PDFs are read and written with `lopdf`, images decoded and resampled with
//! `image`. There are no system dependencies: no Ghostscript, no Poppler, no
//! ImageMagick.

pub mod assemble;
pub mod compile;
pub mod config;
pub mod describe;
pub mod imaging;
pub mod logging;
pub mod markers;
pub mod materialize;
pub mod naming;
pub mod output;
pub mod select;
pub mod writer;
