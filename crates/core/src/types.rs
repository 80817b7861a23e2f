/// Backend primary keys are integers.
pub type DbId = i64;
