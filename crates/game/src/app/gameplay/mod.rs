mod definitions;
mod effects;
mod populate;
mod scene_impl;

pub(crate) use definitions::build_def_database;
pub(crate) use scene_impl::GameplayScene;
