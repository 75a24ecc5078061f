// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use githooks_common_process::{CommandLine, CommandOutput, ProcessRunner, RunOptions, SystemRunner};
use tracing::{debug, instrument, trace};

use crate::error::GitError;
use crate::format::{ExtensionFilter, LogFormat, ShowFormat};
use crate::memo::{MemoCache, DEFAULT_CAPACITY};
use crate::records::{CommitRecord, FileChangeRecord};
use crate::{is_null_revision, NULL_REVISION};

/// How `parse_show` treats renamed files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenamePolicy {
	/// Let git detect renames; their `R` lines do not match the raw line
	/// pattern and are logged and skipped.
	#[default]
	Skip,
	/// Pass `--no-renames` so git reports a rename as a delete of the old path
	/// and an add of the new one.
	DeleteAdd,
}

/// Settings shared by every query a [`CommandGitClient`] runs.
#[derive(Clone, Debug)]
pub struct GitClientOptions {
	/// Git executable, looked up in PATH unless absolute.
	pub git_binary: String,
	pub log_format: LogFormat,
	pub show_format: ShowFormat,
	pub rename_policy: RenamePolicy,
	/// Applied to every git invocation. `check` is always enforced.
	pub run_options: RunOptions,
	pub log_cache_capacity: NonZeroUsize,
	/// Directory for temporary attribute-lookup indexes. Defaults to the
	/// system temporary directory.
	pub temp_dir: Option<PathBuf>,
}

impl Default for GitClientOptions {
	fn default() -> Self {
		Self {
			git_binary: "git".to_string(),
			log_format: LogFormat::default(),
			show_format: ShowFormat::default(),
			rename_policy: RenamePolicy::default(),
			run_options: RunOptions::default(),
			log_cache_capacity: NonZeroUsize::new(DEFAULT_CAPACITY).unwrap_or(NonZeroUsize::MIN),
			temp_dir: None,
		}
	}
}

/// A `git log` request for the commits introduced by a ref update.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LogQuery {
	pub repository: PathBuf,
	/// Full name of the ref being updated, e.g. `refs/heads/main`.
	pub branch: String,
	pub old_revision: String,
	pub new_revision: String,
	/// When false, commits reachable from any other ref are excluded.
	pub this_branch_only: bool,
}

impl LogQuery {
	pub fn new(
		repository: impl Into<PathBuf>,
		branch: impl Into<String>,
		old_revision: impl Into<String>,
		new_revision: impl Into<String>,
	) -> Self {
		Self {
			repository: repository.into(),
			branch: branch.into(),
			old_revision: old_revision.into(),
			new_revision: new_revision.into(),
			this_branch_only: true,
		}
	}

	pub fn this_branch_only(mut self, this_branch_only: bool) -> Self {
		self.this_branch_only = this_branch_only;
		self
	}

	/// True when the ref is being created (old side is the null revision).
	pub fn is_branch_creation(&self) -> bool {
		is_null_revision(&self.old_revision)
	}

	/// The query actually run: a newly created branch always excludes
	/// commits known to other refs, whatever the caller asked for.
	pub fn effective(&self) -> Self {
		let mut query = self.clone();
		if query.is_branch_creation() {
			query.this_branch_only = false;
		}
		query
	}
}

/// Git client implementation using the git CLI.
pub struct CommandGitClient<R = SystemRunner> {
	runner: R,
	options: GitClientOptions,
	log_cache: MemoCache<LogQuery, Vec<CommitRecord>>,
}

impl CommandGitClient<SystemRunner> {
	pub fn new(options: GitClientOptions) -> Self {
		Self::with_runner(SystemRunner::new(), options)
	}
}

impl Default for CommandGitClient<SystemRunner> {
	fn default() -> Self {
		Self::new(GitClientOptions::default())
	}
}

impl<R: ProcessRunner> CommandGitClient<R> {
	pub fn with_runner(runner: R, options: GitClientOptions) -> Self {
		let log_cache = MemoCache::new("git_log", options.log_cache_capacity);
		Self {
			runner,
			options,
			log_cache,
		}
	}

	pub fn options(&self) -> &GitClientOptions {
		&self.options
	}

	pub fn log_cache(&self) -> &MemoCache<LogQuery, Vec<CommitRecord>> {
		&self.log_cache
	}

	#[cfg(test)]
	pub(crate) fn runner(&self) -> &R {
		&self.runner
	}

	/// A git command line rooted at `repo`.
	pub(crate) fn git(&self, repo: &Path) -> CommandLine {
		CommandLine::new(self.options.git_binary.clone()).current_dir(repo)
	}

	pub(crate) fn run_git(&self, cmd: &CommandLine) -> Result<CommandOutput, GitError> {
		let mut options = self.options.run_options.clone();
		options.check = true;
		Ok(self.runner.run(cmd, &options)?)
	}

	/// Lists every ref in the repository (`git for-each-ref`).
	pub fn list_refs(&self, repo: &Path) -> Result<Vec<String>, GitError> {
		let cmd = self
			.git(repo)
			.args(["for-each-ref", "--format=%(refname)"]);
		let output = self.run_git(&cmd)?;
		let refs: Vec<String> = output
			.stdout_lossy()
			.lines()
			.map(str::trim)
			.filter(|line| !line.is_empty())
			.map(str::to_string)
			.collect();

		trace!(repo = %repo.display(), refs_count = refs.len(), "listed refs");
		Ok(refs)
	}

	/// Returns the commits introduced by a ref update, newest first.
	///
	/// Results are memoized per effective query for the lifetime of the
	/// client; repeated calls return the same `Arc`.
	pub fn parse_log(&self, query: &LogQuery) -> Result<Arc<Vec<CommitRecord>>, GitError> {
		let query = query.effective();
		self
			.log_cache
			.get_or_try_insert_with(&query, || self.query_log(&query))
	}

	#[instrument(
		name = "git_log",
		skip(self, query),
		fields(repo = %query.repository.display(), branch = %query.branch)
	)]
	fn query_log(&self, query: &LogQuery) -> Result<Vec<CommitRecord>, GitError> {
		let mut cmd = self
			.git(&query.repository)
			.arg("log")
			.arg(self.options.log_format.format_arg());

		cmd = if query.is_branch_creation() {
			cmd.arg(query.new_revision.as_str())
		} else {
			cmd.arg(format!("{}..{}", query.old_revision, query.new_revision))
		};

		if !query.this_branch_only {
			let other_refs: Vec<String> = self
				.list_refs(&query.repository)?
				.into_iter()
				.filter(|r| *r != query.branch)
				.collect();
			if !other_refs.is_empty() {
				cmd = cmd.args(["--ignore-missing", "--not"]).args(other_refs);
			}
		}

		let output = self.run_git(&cmd)?;
		let stdout = output.stdout_lossy();
		if stdout.trim().is_empty() {
			debug!("empty git log");
			return Ok(Vec::new());
		}

		let commits = self.options.log_format.parse(&stdout)?;
		for commit in &commits {
			debug!(commit = %commit.commit, author = %commit.author_email, "parsed commit");
		}
		Ok(commits)
	}

	/// Returns the files changed by `revision` against its first parent.
	///
	/// Paths are kept only if they match `filter`, when one is given.
	#[instrument(name = "git_show", skip(self, repo, filter), fields(repo = %repo.display()))]
	pub fn parse_show(
		&self,
		repo: &Path,
		revision: &str,
		filter: Option<&ExtensionFilter>,
	) -> Result<Vec<FileChangeRecord>, GitError> {
		if is_null_revision(revision) {
			return Err(GitError::InvalidArgument(format!(
				"cannot show changes of the null revision {NULL_REVISION}"
			)));
		}

		let mut cmd = self
			.git(repo)
			.args(["show", "--first-parent", "--raw", "--no-abbrev", "--format="]);
		if self.options.rename_policy == RenamePolicy::DeleteAdd {
			cmd = cmd.arg("--no-renames");
		}
		cmd = cmd.arg(revision);

		let output = self.run_git(&cmd)?;
		let records = self
			.options
			.show_format
			.parse(&output.stdout_lossy(), filter);

		debug!(files_count = records.len(), "parsed git show");
		Ok(records)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::records::FileStatus;
	use crate::test_support::{
		commit_file, git, init_git_repo, log_line, raw_line, remove_file, ScriptedRunner,
	};
	use tempfile::TempDir;

	const SHA_A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
	const SHA_B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

	fn scripted_client(runner: ScriptedRunner) -> CommandGitClient<ScriptedRunner> {
		CommandGitClient::with_runner(runner, GitClientOptions::default())
	}

	/// Test: Synthetic log output with N records yields N commits in order.
	///
	/// Why this test is important: This is the core contract of parse_log;
	/// notifications list commits in exactly the order git reported them.
	#[test]
	fn test_parse_log_yields_all_records() {
		let stdout = format!(
			"{}{}{}",
			log_line(SHA_B, "Bob", "bob@example.com", "second"),
			log_line(SHA_A, "Alice", "alice@example.com", "first"),
			log_line(&"c".repeat(40), "Carol", "carol@example.com", "third"),
		);
		let client = scripted_client(ScriptedRunner::new().on("log", &stdout));

		let commits = client
			.parse_log(&LogQuery::new("/repo", "refs/heads/main", SHA_A, SHA_B))
			.unwrap();

		assert_eq!(commits.len(), 3);
		assert_eq!(commits[0].commit, SHA_B);
		assert_eq!(commits[0].author_name, "Bob");
		assert_eq!(commits[1].message, "first");
		assert_eq!(commits[2].author_email, "carol@example.com");
	}

	#[test]
	fn test_parse_log_empty_output_is_empty() {
		let client = scripted_client(ScriptedRunner::new().on("log", ""));
		let commits = client
			.parse_log(&LogQuery::new("/repo", "refs/heads/main", SHA_A, SHA_B))
			.unwrap();
		assert!(commits.is_empty());
	}

	/// Test: An update of an existing branch queries exactly old..new.
	///
	/// Why this test is important: With this_branch_only set, no ref listing
	/// is needed and the range must not be widened.
	#[test]
	fn test_existing_branch_uses_range() {
		let runner = ScriptedRunner::new().on("log", "");
		let client = scripted_client(runner);
		client
			.parse_log(&LogQuery::new("/repo", "refs/heads/main", SHA_A, SHA_B))
			.unwrap();

		let calls = client.runner().calls();
		assert_eq!(calls.len(), 1);
		assert_eq!(calls[0][0], "log");
		assert!(calls[0].contains(&format!("{SHA_A}..{SHA_B}")));
		assert!(!calls[0].contains(&"--not".to_string()));
	}

	/// Test: Branch creation forces exclusion of commits known to other refs.
	///
	/// Why this test is important: Pushing a new branch based on main must not
	/// notify about every commit already on main, even if the caller asked
	/// for this_branch_only.
	#[test]
	fn test_branch_creation_forces_ref_exclusion() {
		let runner = ScriptedRunner::new()
			.on("for-each-ref", "refs/heads/main\nrefs/heads/feature\nrefs/tags/v1\n")
			.on("log", "");
		let client = scripted_client(runner);

		let query = LogQuery::new("/repo", "refs/heads/feature", NULL_REVISION, SHA_B).this_branch_only(true);
		client.parse_log(&query).unwrap();

		let calls = client.runner().calls();
		assert_eq!(calls.len(), 2);
		assert_eq!(calls[0][0], "for-each-ref");

		let log = &calls[1];
		assert_eq!(log[0], "log");
		assert!(log.contains(&SHA_B.to_string()));
		assert!(!log.iter().any(|a| a.contains("..")));
		let not_at = log.iter().position(|a| a == "--not").unwrap();
		assert_eq!(log[not_at - 1], "--ignore-missing");
		assert_eq!(
			&log[not_at + 1..],
			&["refs/heads/main".to_string(), "refs/tags/v1".to_string()]
		);
	}

	#[test]
	fn test_no_exclusion_when_branch_is_only_ref() {
		let runner = ScriptedRunner::new()
			.on("for-each-ref", "refs/heads/main\n")
			.on("log", "");
		let client = scripted_client(runner);

		let query = LogQuery::new("/repo", "refs/heads/main", SHA_A, SHA_B).this_branch_only(false);
		client.parse_log(&query).unwrap();

		let calls = client.runner().calls();
		assert!(!calls[1].contains(&"--not".to_string()));
	}

	/// Test: Repeated identical queries hit git once and share the result.
	///
	/// Why this test is important: Several hooks in one push ask for the same
	/// log; the memo cache must serve them without rerunning git.
	#[test]
	fn test_parse_log_is_memoized() {
		let stdout = log_line(SHA_B, "Bob", "bob@example.com", "second");
		let client = scripted_client(ScriptedRunner::new().on("log", &stdout));
		let query = LogQuery::new("/repo", "refs/heads/main", SHA_A, SHA_B);

		let first = client.parse_log(&query).unwrap();
		let second = client.parse_log(&query).unwrap();
		assert!(Arc::ptr_eq(&first, &second));
		assert_eq!(client.runner().calls().len(), 1);

		let other = LogQuery::new("/repo", "refs/heads/other", SHA_A, SHA_B);
		client.parse_log(&other).unwrap();
		assert_eq!(client.runner().calls().len(), 2);
	}

	/// Test: Branch creation queries that differ only in the requested flag
	/// share one cache entry.
	///
	/// Why this test is important: The flag is forced before the lookup, so
	/// both requests describe the same git invocation.
	#[test]
	fn test_branch_creation_flag_normalized_in_cache() {
		let runner = ScriptedRunner::new()
			.on("for-each-ref", "refs/heads/main\n")
			.on("log", "");
		let client = scripted_client(runner);

		let base = LogQuery::new("/repo", "refs/heads/new", NULL_REVISION, SHA_B);
		client.parse_log(&base.clone().this_branch_only(true)).unwrap();
		client.parse_log(&base.this_branch_only(false)).unwrap();

		assert_eq!(client.log_cache().len(), 1);
	}

	#[test]
	fn test_parse_log_failure_is_not_cached() {
		let client = scripted_client(ScriptedRunner::new().fail("log", 128, "fatal: bad revision"));
		let query = LogQuery::new("/repo", "refs/heads/main", SHA_A, SHA_B);

		let err = client.parse_log(&query).unwrap_err();
		assert!(matches!(err, GitError::Process(_)));
		assert!(client.log_cache().is_empty());
	}

	#[test]
	fn test_parse_show_rejects_null_revision() {
		let client = scripted_client(ScriptedRunner::new());
		let err = client
			.parse_show(Path::new("/repo"), NULL_REVISION, None)
			.unwrap_err();
		assert!(matches!(err, GitError::InvalidArgument(_)));
		assert!(client.runner().calls().is_empty());
	}

	#[test]
	fn test_parse_show_uses_raw_first_parent_arguments() {
		let stdout = format!("{}\n", raw_line("M", "path/to/file.py"));
		let client = scripted_client(ScriptedRunner::new().on("show", &stdout));

		let records = client.parse_show(Path::new("/repo"), SHA_B, None).unwrap();
		assert_eq!(records.len(), 1);
		assert_eq!(records[0].status, FileStatus::Modified);

		let calls = client.runner().calls();
		assert_eq!(
			calls[0],
			vec!["show", "--first-parent", "--raw", "--no-abbrev", "--format=", SHA_B]
		);
	}

	#[test]
	fn test_delete_add_policy_disables_rename_detection() {
		let options = GitClientOptions {
			rename_policy: RenamePolicy::DeleteAdd,
			..GitClientOptions::default()
		};
		let client = CommandGitClient::with_runner(ScriptedRunner::new().on("show", ""), options);
		client.parse_show(Path::new("/repo"), SHA_B, None).unwrap();

		assert!(client.runner().calls()[0].contains(&"--no-renames".to_string()));
	}

	/// Test: parse_log against a real repository returns only the pushed range.
	///
	/// Why this test is important: Verifies the format string, separators and
	/// range syntax against the actual git binary rather than canned output.
	#[test]
	fn test_parse_log_real_repository_range() {
		let temp = TempDir::new().unwrap();
		init_git_repo(temp.path());
		let first = commit_file(temp.path(), "README.md", "# Test", "Initial commit");
		let second = commit_file(temp.path(), "README.md", "# Changed", "Update readme: details");

		let client = CommandGitClient::default();
		let commits = client
			.parse_log(&LogQuery::new(temp.path(), "refs/heads/main", &first, &second))
			.unwrap();

		assert_eq!(commits.len(), 1);
		assert_eq!(commits[0].commit, second);
		assert_eq!(commits[0].author_name, "Test");
		assert_eq!(commits[0].author_email, "test@test.com");
		assert_eq!(commits[0].message, "Update readme: details");
		assert!(!commits[0].date.is_empty());
	}

	/// Test: A new branch reports only commits not reachable from other refs.
	///
	/// Why this test is important: This is the scenario the ref exclusion
	/// exists for; commits already on main must not be re-announced.
	#[test]
	fn test_parse_log_real_repository_new_branch() {
		let temp = TempDir::new().unwrap();
		init_git_repo(temp.path());
		commit_file(temp.path(), "README.md", "# Test", "Initial commit");
		git(temp.path(), &["checkout", "-q", "-b", "feature"]);
		let feature = commit_file(temp.path(), "feature.txt", "feature", "Add feature");

		let client = CommandGitClient::default();
		let commits = client
			.parse_log(&LogQuery::new(
				temp.path(),
				"refs/heads/feature",
				NULL_REVISION,
				&feature,
			))
			.unwrap();

		assert_eq!(commits.len(), 1);
		assert_eq!(commits[0].commit, feature);
		assert_eq!(commits[0].message, "Add feature");
	}

	#[test]
	fn test_list_refs_real_repository() {
		let temp = TempDir::new().unwrap();
		init_git_repo(temp.path());
		commit_file(temp.path(), "README.md", "# Test", "Initial commit");
		git(temp.path(), &["tag", "v1"]);

		let refs = CommandGitClient::default().list_refs(temp.path()).unwrap();
		assert!(refs.contains(&"refs/heads/main".to_string()));
		assert!(refs.contains(&"refs/tags/v1".to_string()));
	}

	/// Test: parse_show reports modified, added and deleted files.
	///
	/// Why this test is important: All three statuses must come through from
	/// the real raw diff format, including blob ids.
	#[test]
	fn test_parse_show_real_repository() {
		let temp = TempDir::new().unwrap();
		init_git_repo(temp.path());
		commit_file(temp.path(), "keep.py", "a = 1\n", "Initial commit");
		commit_file(temp.path(), "drop.txt", "bye\n", "Add drop");

		std::fs::write(temp.path().join("keep.py"), "a = 2\n").unwrap();
		std::fs::write(temp.path().join("new file.py"), "b = 1\n").unwrap();
		remove_file(temp.path(), "drop.txt");
		git(temp.path(), &["add", "-A"]);
		git(temp.path(), &["commit", "-q", "-m", "Mixed change"]);
		let head = git(temp.path(), &["rev-parse", "HEAD"]);

		let client = CommandGitClient::default();
		let mut records = client.parse_show(temp.path(), &head, None).unwrap();
		records.sort_by(|a, b| a.path.cmp(&b.path));

		let summary: Vec<(&str, FileStatus)> = records
			.iter()
			.map(|r| (r.path.as_str(), r.status))
			.collect();
		assert_eq!(
			summary,
			vec![
				("drop.txt", FileStatus::Deleted),
				("keep.py", FileStatus::Modified),
				("new file.py", FileStatus::Added),
			]
		);
		assert!(records.iter().all(|r| r.old_object_id.len() == 40));

		let filter = ExtensionFilter::new([".py"]);
		let filtered = client.parse_show(temp.path(), &head, Some(&filter)).unwrap();
		assert_eq!(filtered.len(), 2);
	}

	/// Test: A non-ASCII path comes back decoded and passes a suffix filter.
	///
	/// Why this test is important: git quotes such paths in raw output; a
	/// hook checking `.py` files must still see `café.py`.
	#[test]
	fn test_parse_show_non_ascii_path() {
		let temp = TempDir::new().unwrap();
		init_git_repo(temp.path());
		commit_file(temp.path(), "readme.txt", "hi\n", "Initial commit");
		let head = commit_file(temp.path(), "café.py", "x = 1\n", "Add café");

		let client = CommandGitClient::default();
		let filter = ExtensionFilter::new([".py"]);
		let records = client.parse_show(temp.path(), &head, Some(&filter)).unwrap();

		assert_eq!(records.len(), 1);
		assert_eq!(records[0].path, "café.py");
		assert_eq!(records[0].status, FileStatus::Added);
	}

	/// Test: With the delete/add policy a rename shows up as two records.
	///
	/// Why this test is important: Hooks that validate new files would miss a
	/// renamed file entirely under the default policy.
	#[test]
	fn test_rename_split_into_delete_and_add() {
		let temp = TempDir::new().unwrap();
		init_git_repo(temp.path());
		commit_file(temp.path(), "old.py", "print('hello world')\n", "Initial commit");
		git(temp.path(), &["mv", "old.py", "new.py"]);
		git(temp.path(), &["commit", "-q", "-m", "Rename"]);
		let head = git(temp.path(), &["rev-parse", "HEAD"]);

		let skip = CommandGitClient::default();
		let skipped = skip.parse_show(temp.path(), &head, None).unwrap();
		assert!(skipped.is_empty());

		let split = CommandGitClient::new(GitClientOptions {
			rename_policy: RenamePolicy::DeleteAdd,
			..GitClientOptions::default()
		});
		let mut records = split.parse_show(temp.path(), &head, None).unwrap();
		records.sort_by(|a, b| a.path.cmp(&b.path));
		assert_eq!(records.len(), 2);
		assert_eq!(records[0].path, "new.py");
		assert_eq!(records[0].status, FileStatus::Added);
		assert_eq!(records[1].path, "old.py");
		assert_eq!(records[1].status, FileStatus::Deleted);
	}
}
