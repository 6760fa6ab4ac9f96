// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/// Row to move to from `active` within the playable rows
///
/// `playable` holds the indices of playable rows in display order. Moving
/// wraps at both ends; an active row outside the set jumps to the first
/// playable row. `None` when nothing is playable.
pub fn next_playable(playable: &[usize], active: Option<usize>) -> Option<usize> {
    step(playable, active, true)
}

pub fn previous_playable(playable: &[usize], active: Option<usize>) -> Option<usize> {
    step(playable, active, false)
}

fn step(playable: &[usize], active: Option<usize>, forward: bool) -> Option<usize> {
    let first = *playable.first()?;
    let Some(at) = active.and_then(|index| playable.iter().position(|&p| p == index)) else {
        return Some(first);
    };

    let len = playable.len();
    let target = if forward {
        (at + 1) % len
    } else {
        (at + len - 1) % len
    };
    Some(playable[target])
}
