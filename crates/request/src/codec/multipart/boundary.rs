use rand::distributions::Alphanumeric;
use rand::Rng;

/// Fixed prefix of every generated boundary
const BOUNDARY_PREFIX: &str = "----micro-request-";

/// Number of random alphanumeric characters following the prefix
const BOUNDARY_TOKEN_LEN: usize = 24;

/// Generates a fresh multipart boundary.
///
/// Every materialization of a form body calls this, so two reads of the same
/// entries are framed with different boundaries.
pub fn generate_boundary() -> String {
    let mut boundary = String::with_capacity(BOUNDARY_PREFIX.len() + BOUNDARY_TOKEN_LEN);
    boundary.push_str(BOUNDARY_PREFIX);
    boundary.extend(rand::thread_rng().sample_iter(&Alphanumeric).take(BOUNDARY_TOKEN_LEN).map(char::from));
    boundary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_shape() {
        let boundary = generate_boundary();

        assert!(boundary.starts_with(BOUNDARY_PREFIX));
        assert_eq!(boundary.len(), BOUNDARY_PREFIX.len() + BOUNDARY_TOKEN_LEN);
        assert!(boundary[BOUNDARY_PREFIX.len()..].bytes().all(|b| b.is_ascii_alphanumeric()));
    }

    #[test]
    fn boundaries_are_distinct() {
        assert_ne!(generate_boundary(), generate_boundary());
    }
}
