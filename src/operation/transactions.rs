use bson::doc;

use crate::cmap::Command;

pub(crate) fn build_commit_transaction() -> Command {
    Command::new(
        "commitTransaction",
        "admin",
        doc! { "commitTransaction": 1 },
    )
}

pub(crate) fn build_abort_transaction() -> Command {
    Command::new("abortTransaction", "admin", doc! { "abortTransaction": 1 })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn commit_and_abort_target_admin() {
        assert_eq!(build_commit_transaction().target_db, "admin");
        assert_eq!(build_abort_transaction().target_db, "admin");
    }
}
