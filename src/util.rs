pub fn indicies_to_flags(indicies: &[usize], len: usize) -> Vec<bool> {
  let mut flags = vec![false; len];
  indicies.iter().for_each(|&i| flags[i] = true);
  flags
}

pub fn flags_to_indicies(flags: &[bool]) -> Vec<usize> {
  flags
    .iter()
    .enumerate()
    .filter_map(|(i, &flag)| flag.then_some(i))
    .collect()
}

/// Consecutive differences $x_(i+1) - x_i$.
pub fn consecutive_diffs(values: &[f64]) -> Vec<f64> {
  values.windows(2).map(|w| w[1] - w[0]).collect()
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn flags_roundtrip() {
    let indicies = vec![1, 4, 5];
    let flags = indicies_to_flags(&indicies, 7);
    assert_eq!(flags, vec![false, true, false, false, true, true, false]);
    assert_eq!(flags_to_indicies(&flags), indicies);
  }

  #[test]
  fn diffs() {
    assert_eq!(consecutive_diffs(&[1.0, 3.0, 6.0]), vec![2.0, 3.0]);
    assert!(consecutive_diffs(&[1.0]).is_empty());
  }
}
