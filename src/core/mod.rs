/*!

Internal machinery shared by the matchers. Nothing here is part of the public API.

*/

pub(crate) mod compositions;
