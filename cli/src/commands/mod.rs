mod add;
mod helpers;
mod list;
mod summary;

pub(crate) use add::cmd_add;
pub(crate) use list::cmd_list;
pub(crate) use summary::cmd_summary;
