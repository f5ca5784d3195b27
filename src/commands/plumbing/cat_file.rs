use crate::areas::repository::Repository;
use crate::artifacts::objects::object_type::ObjectType;

impl Repository {
    /// Print an object's content, or with `show_type` its kind. Short IDs
    /// are accepted.
    pub fn cat_file(&self, object_id: &str, show_type: bool) -> anyhow::Result<()> {
        self.ensure_initialized()?;

        let object_id = self.database().resolve(object_id)?;
        let object = self.database().parse_object(&object_id)?;

        if show_type {
            writeln!(self.writer(), "{}", object.object_type())?;
            return Ok(());
        }

        match object.object_type() {
            // blob bytes go out untouched, they need not be text
            ObjectType::Blob => self.writer().write_all(&object.serialize()?)?,
            ObjectType::Tree | ObjectType::Commit => {
                writeln!(self.writer(), "{}", object.display())?
            }
        }

        Ok(())
    }
}
