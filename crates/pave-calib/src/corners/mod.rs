//! Chessboard corner primitives: dense ChESS response, candidate extraction,
//! lattice assembly and sub-pixel refinement.

pub mod detect;
pub mod grid;
pub mod response;
pub mod subpix;

pub use detect::{find_candidates, CandidateParams, CornerCandidate};
pub use grid::{assemble_grid, GridParams};
pub use response::{chess_response, ResponseMap};
