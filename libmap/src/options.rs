use crate::library::Options;

/// True iff every binding in `src` is already present in `dst` with the
/// same value.
pub fn opts_applied(dst: &Options, src: &Options) -> bool {
    src.iter().all(|(name, value)| dst.get(name) == Some(value))
}

/// Merges `src` into `dst`, failing on the first disagreeing binding. On
/// failure `dst` may be partially extended; callers apply to a clone and
/// discard it on failure.
pub fn apply_opts(dst: &mut Options, src: &Options) -> bool {
    for (name, value) in src {
        match dst.get(name) {
            None => {
                dst.insert(name.clone(), value.clone());
            }
            Some(bound) if bound == value => (),
            Some(_) => return false,
        }
    }
    true
}

#[cfg(test)]
mod test {
    use super::{apply_opts, opts_applied};
    use crate::library::{OptionValue, Options};

    fn options(pairs: &[(&str, i64)]) -> Options {
        pairs.iter().map(|&(name, value)| (name.to_owned(), OptionValue::Int(value))).collect()
    }

    #[test]
    fn test_apply() {
        let mut env = options(&[("A", 1)]);
        assert!(apply_opts(&mut env, &options(&[("B", 2)])));
        assert_eq!(env, options(&[("A", 1), ("B", 2)]));
        assert!(apply_opts(&mut env, &options(&[("A", 1), ("B", 2)])));
        assert!(!apply_opts(&mut env, &options(&[("B", 3)])));
    }

    #[test]
    fn test_applied() {
        let env = options(&[("A", 1), ("B", 2)]);
        assert!(opts_applied(&env, &options(&[])));
        assert!(opts_applied(&env, &options(&[("B", 2)])));
        assert!(!opts_applied(&env, &options(&[("C", 3)])));
        assert!(!opts_applied(&env, &options(&[("A", 2)])));
    }
}
