//! checksum - Internet checksum (RFC 1071) primitives
//!
//! Words are summed in network byte order.  All loops have a trip count
//! that is fixed at compile time.

use crate::protocols::ipv4::{IPPROTO_TCP, IPV4_LEN, Ipv4Hdr};

/// Upper bound on the TCP segment bytes covered by `tcp_csum`.
pub const MAX_TCP_SIZE: usize = 1448;

const TCP_CHECK_OFFSET: usize = 16;

/// Fold a 32-bit accumulator into 16 bits and complement it.  Two folds are
/// always enough for a 32-bit input.
pub fn csum_fold_helper(csum: u32) -> u16 {
    let mut sum = (csum >> 16) + (csum & 0xffff);
    sum += sum >> 16;
    !(sum as u16)
}

/// Fold a 64-bit accumulator into 16 bits and complement it.
pub fn csum_fold_helperx(mut csum: u64) -> u16 {
    for _ in 0..4 {
        if csum >> 16 != 0 {
            csum = (csum & 0xffff) + (csum >> 16);
        }
    }
    !(csum as u16)
}

fn sum_words(data: &[u8]) -> u64 {
    let mut chunks = data.chunks_exact(2);
    let mut sum: u64 = chunks
        .by_ref()
        .map(|w| u16::from_be_bytes([w[0], w[1]]) as u64)
        .sum();
    if let [tail] = chunks.remainder() {
        sum += (*tail as u64) << 8;
    }
    sum
}

/// Unfolded ones'-complement difference between two byte runs, added to
/// `seed`: the sum of the words of `to` minus the sum of the words of
/// `from`.  Either run may be empty, which turns this into a plain partial
/// sum.
pub fn csum_diff(from: &[u8], to: &[u8], seed: u64) -> u64 {
    let mut chunks = from.chunks_exact(2);
    let mut removed: u64 = chunks
        .by_ref()
        .map(|w| !u16::from_be_bytes([w[0], w[1]]) as u64)
        .sum();
    if let [tail] = chunks.remainder() {
        removed += !((*tail as u16) << 8) as u64;
    }
    seed + removed + sum_words(to)
}

/// Checksum over an arbitrary byte run.
pub fn ipv4_csum(data: &[u8], seed: u64) -> u16 {
    csum_fold_helperx(csum_diff(&[], data, seed))
}

/// Checksum of an IPv4 header via the byte-run form.  The check field is
/// zeroed first; the caller stores the result.
pub fn iph_csum(iph: &mut [u8; IPV4_LEN]) -> u16 {
    iph[Ipv4Hdr::CHECK_OFFSET..Ipv4Hdr::CHECK_OFFSET + 2].fill(0);
    ipv4_csum(iph, 0)
}

/// Recompute an IPv4 header checksum in place, walking the ten header
/// words directly.  Returns the value written.
pub fn ipv4_csum_inline(iph: &mut [u8; IPV4_LEN]) -> u16 {
    iph[Ipv4Hdr::CHECK_OFFSET..Ipv4Hdr::CHECK_OFFSET + 2].fill(0);
    let mut csum: u32 = 0;
    for i in 0..IPV4_LEN / 2 {
        csum += u16::from_be_bytes([iph[2 * i], iph[2 * i + 1]]) as u32;
    }
    let check = csum_fold_helper(csum);
    iph[Ipv4Hdr::CHECK_OFFSET..Ipv4Hdr::CHECK_OFFSET + 2].copy_from_slice(&check.to_be_bytes());
    check
}

/// TCP checksum over the IPv4 pseudo-header and the segment.  The segment's
/// own check field is treated as zero.  Only the first `MAX_TCP_SIZE` bytes
/// of the segment are covered, so longer segments get a wrong checksum.
///
/// No hook calls this.  The outer encapsulation is UDP with a zero
/// checksum and inner TCP segments are never rewritten.
pub fn tcp_csum(iph: &Ipv4Hdr, segment: &[u8]) -> u16 {
    let mut csum: u32 = 0;

    // Pseudo-header.
    csum += u16::from_be_bytes([iph.saddr[0], iph.saddr[1]]) as u32;
    csum += u16::from_be_bytes([iph.saddr[2], iph.saddr[3]]) as u32;
    csum += u16::from_be_bytes([iph.daddr[0], iph.daddr[1]]) as u32;
    csum += u16::from_be_bytes([iph.daddr[2], iph.daddr[3]]) as u32;
    csum += IPPROTO_TCP as u32;
    csum += iph.tot_len().wrapping_sub(iph.ihl() as u16 * 4) as u32;

    let covered = segment.len().min(MAX_TCP_SIZE);
    for i in (0..MAX_TCP_SIZE).step_by(2) {
        if i + 2 > covered {
            break;
        }
        if i != TCP_CHECK_OFFSET {
            csum += u16::from_be_bytes([segment[i], segment[i + 1]]) as u32;
        }
    }
    if covered % 2 == 1 {
        csum += (segment[covered - 1] as u32) << 8;
    }

    csum_fold_helper(csum)
}
