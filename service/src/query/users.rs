//! [`Query`] collection related to the multiple [`User`]s.

use common::operations::By;

use crate::read;
#[cfg(doc)]
use crate::{domain::User, Query};

use super::DatabaseQuery;

/// Queries a list of [`User`]s.
pub type List =
    DatabaseQuery<By<read::user::list::Page, read::user::list::Selector>>;

/// Queries total count of [`User`] list items.
pub type TotalCount =
    DatabaseQuery<By<read::user::list::TotalCount, read::user::list::Filter>>;
