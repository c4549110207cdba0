//! Thresholding, non-maximum suppression and centre-of-mass refinement on a
//! ChESS response map.

use super::response::ResponseMap;
use pave_core::{Pt2, Real};
use serde::{Deserialize, Serialize};

/// Tunable parameters for candidate extraction.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateParams {
    /// Relative threshold as a fraction of the maximum response.
    pub threshold_rel: f32,
    /// Non-maximum suppression radius in pixels.
    pub nms_radius: u32,
    /// Minimum number of positive neighbours in the 3x3 neighbourhood;
    /// rejects isolated single-pixel noise.
    pub min_cluster_size: u32,
    /// Keep at most this many candidates, strongest first.
    pub max_candidates: usize,
}

impl Default for CandidateParams {
    fn default() -> Self {
        Self {
            threshold_rel: 0.2,
            nms_radius: 3,
            min_cluster_size: 2,
            max_candidates: 600,
        }
    }
}

/// A corner candidate with sub-pixel position and raw response.
#[derive(Clone, Copy, Debug)]
pub struct CornerCandidate {
    pub position: Pt2,
    pub strength: f32,
}

/// Extract corner candidates sorted by decreasing strength.
pub fn find_candidates(resp: &ResponseMap, params: &CandidateParams) -> Vec<CornerCandidate> {
    let max = resp.max();
    if !(max > 0.0) {
        return Vec::new();
    }
    let thresh = params.threshold_rel * max;
    let r = params.nms_radius as i64;
    let (w, h) = (resp.w as i64, resp.h as i64);

    let mut out = Vec::new();
    for y in 0..h {
        for x in 0..w {
            let v = resp.at(x as usize, y as usize);
            if v <= thresh || !is_local_max(resp, x, y, r, v) {
                continue;
            }
            if positive_neighbours(resp, x, y) < params.min_cluster_size {
                continue;
            }
            out.push(CornerCandidate {
                position: center_of_mass(resp, x, y),
                strength: v,
            });
        }
    }

    out.sort_by(|a, b| b.strength.total_cmp(&a.strength));
    out.truncate(params.max_candidates);
    out
}

fn is_local_max(resp: &ResponseMap, x: i64, y: i64, r: i64, v: f32) -> bool {
    let (w, h) = (resp.w as i64, resp.h as i64);
    for yy in (y - r).max(0)..=(y + r).min(h - 1) {
        for xx in (x - r).max(0)..=(x + r).min(w - 1) {
            if xx == x && yy == y {
                continue;
            }
            let o = resp.at(xx as usize, yy as usize);
            // plateaus keep the first pixel in raster order
            if o > v || (o == v && (yy, xx) < (y, x)) {
                return false;
            }
        }
    }
    true
}

fn positive_neighbours(resp: &ResponseMap, x: i64, y: i64) -> u32 {
    let (w, h) = (resp.w as i64, resp.h as i64);
    let mut count = 0;
    for yy in (y - 1).max(0)..=(y + 1).min(h - 1) {
        for xx in (x - 1).max(0)..=(x + 1).min(w - 1) {
            if (xx != x || yy != y) && resp.at(xx as usize, yy as usize) > 0.0 {
                count += 1;
            }
        }
    }
    count
}

/// 5x5 weighted centroid of the positive response around `(x, y)`.
fn center_of_mass(resp: &ResponseMap, x: i64, y: i64) -> Pt2 {
    let (w, h) = (resp.w as i64, resp.h as i64);
    let (mut sx, mut sy, mut sw) = (0.0 as Real, 0.0 as Real, 0.0 as Real);
    for yy in (y - 2).max(0)..=(y + 2).min(h - 1) {
        for xx in (x - 2).max(0)..=(x + 2).min(w - 1) {
            let v = resp.at(xx as usize, yy as usize).max(0.0) as Real;
            sx += v * xx as Real;
            sy += v * yy as Real;
            sw += v;
        }
    }
    if sw > 0.0 {
        Pt2::new(sx / sw, sy / sw)
    } else {
        Pt2::new(x as Real, y as Real)
    }
}
