//! Allele trimming and ambiguous-indel shifting
//!
//! An insertion or deletion flanked by repetitive sequence has no single
//! forced position; conventions disagree on where to put it (HGVS shifts
//! 3', VCF shifts 5'). `indel_shift` slides a minimal-representation indel
//! along a sequence window until the sequence stops repeating or a caller
//! imposed limit is reached.

use crate::seq::window::SeqWindow;

/// No limit on shift distance
pub const NO_MAX: u32 = u32::MAX;

/// Direction to shift an ambiguous indel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftDirection {
    /// Toward lower coordinates (VCF convention)
    Left,
    /// Toward higher coordinates (HGVS 3' rule on the + strand)
    Right,
}

/// Shifting applies only to a pure insertion or pure deletion: after
/// trimming, exactly one of ref/alt must be empty.
pub fn indel_shift_applicable(ref_len: usize, alt_len: usize) -> bool {
    (ref_len == 0) != (alt_len == 0)
}

/// Trim bases shared by ref and alt from the end, then from the start,
/// narrowing `[start, end)` to the minimal changed region. After this the
/// two alleles share no leading or trailing base.
pub fn trim_ref_alt(rref: &mut Vec<u8>, alt: &mut Vec<u8>, start: &mut u32, end: &mut u32) {
    while !rref.is_empty() && !alt.is_empty() && rref.last() == alt.last() {
        rref.pop();
        alt.pop();
        *end -= 1;
    }
    let mut shared = 0;
    while shared < rref.len() && shared < alt.len() && rref[shared] == alt[shared] {
        shared += 1;
    }
    if shared > 0 {
        rref.drain(..shared);
        alt.drain(..shared);
        *start += shared as u32;
    }
}

/// Widened fetch range for a sequence window that is about to be used for
/// shifting, so that most shifts proceed without refetching.
pub fn shift_fetch_range(start: u32, ref_len: u32, alt_len: u32) -> (u32, u32) {
    let pad = 1024.max(16 * ref_len.max(alt_len));
    (start.saturating_sub(pad), start + ref_len + pad)
}

/// Shift a pure indel as far as the sequence allows, up to `max_shift`
/// bases, in the given direction. `[start, end)` is the deleted range
/// (empty, `start == end`, for an insertion); `alt` is the inserted
/// sequence (empty for a deletion) and is rotated in place as an insertion
/// slides. Returns the number of bases shifted.
///
/// The window is repositioned as needed; shifting stops at the sequence
/// bounds.
pub fn indel_shift(
    win: &mut dyn SeqWindow,
    start: &mut u32,
    end: &mut u32,
    alt: &mut Vec<u8>,
    max_shift: u32,
    dir: ShiftDirection,
) -> u32 {
    debug_assert!(indel_shift_applicable((*end - *start) as usize, alt.len()));
    let mut shifted = 0;
    if alt.is_empty() {
        // Deletion: slide while the base entering the deleted range matches
        // the base leaving it.
        match dir {
            ShiftDirection::Right => {
                while shifted < max_shift {
                    match (win.base_at(*end), win.base_at(*start)) {
                        (Some(incoming), Some(outgoing)) if incoming == outgoing => {
                            *start += 1;
                            *end += 1;
                            shifted += 1;
                        }
                        _ => break,
                    }
                }
            }
            ShiftDirection::Left => {
                while shifted < max_shift && *start > 0 {
                    match (win.base_at(*start - 1), win.base_at(*end - 1)) {
                        (Some(incoming), Some(outgoing)) if incoming == outgoing => {
                            *start -= 1;
                            *end -= 1;
                            shifted += 1;
                        }
                        _ => break,
                    }
                }
            }
        }
    } else {
        // Insertion: slide while the next reference base matches the edge of
        // the inserted sequence, rotating the insertion as it moves.
        match dir {
            ShiftDirection::Right => {
                while shifted < max_shift {
                    match win.base_at(*start) {
                        Some(b) if b == alt[0] => {
                            alt.rotate_left(1);
                            *start += 1;
                            *end += 1;
                            shifted += 1;
                        }
                        _ => break,
                    }
                }
            }
            ShiftDirection::Left => {
                while shifted < max_shift && *start > 0 {
                    match win.base_at(*start - 1) {
                        Some(b) if b == *alt.last().expect("non-empty alt") => {
                            alt.rotate_right(1);
                            *start -= 1;
                            *end -= 1;
                            shifted += 1;
                        }
                        _ => break,
                    }
                }
            }
        }
    }
    shifted
}
