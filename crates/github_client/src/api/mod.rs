pub mod repos;

pub use repos::{
    CommitDescriptor, GitHubUser, RepoDescriptor, RepoPublisher, DEFAULT_COMMIT_MESSAGE,
    DEFAULT_REPO_DESCRIPTION,
};
