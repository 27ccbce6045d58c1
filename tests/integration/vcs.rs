// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::{url_of, RepoFixture};

use anyhow::Result;
use dots::cache::vcs::{Git2Vcs, Vcs, VcsError};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

#[test]
fn git2_vcs_clone_checks_out_upstream() -> Result<()> {
    let tmp = TempDir::new()?;
    let upstream = RepoFixture::init(tmp.path().join("upstream"))?;
    let expect = upstream.stage_and_commit(".dots.yml", "name: John/dots\n")?;

    let vcs = Git2Vcs::default();
    let dest = tmp.path().join("clone");
    vcs.clone_repo(&url_of(tmp.path().join("upstream")), &dest)?;

    assert!(vcs.is_repository(&dest));
    assert!(!vcs.is_repository(tmp.path()));
    assert_eq!(RepoFixture::open(&dest)?.head()?, expect);
    assert_eq!(std::fs::read_to_string(dest.join(".dots.yml"))?, "name: John/dots\n");

    Ok(())
}

#[test]
fn git2_vcs_upgrade_fast_forwards() -> Result<()> {
    let tmp = TempDir::new()?;
    let upstream = RepoFixture::init(tmp.path().join("upstream"))?;
    upstream.stage_and_commit(".dots.yml", "name: John/dots\n")?;

    let vcs = Git2Vcs::default();
    let dest = tmp.path().join("clone");
    vcs.clone_repo(&url_of(tmp.path().join("upstream")), &dest)?;

    let expect = upstream.stage_and_commit("bspwmrc", "bspc monitor -d I II III\n")?;
    vcs.upgrade(&dest)?;

    assert_eq!(RepoFixture::open(&dest)?.head()?, expect);
    assert_eq!(
        std::fs::read_to_string(dest.join("bspwmrc"))?,
        "bspc monitor -d I II III\n"
    );

    Ok(())
}

#[test]
fn git2_vcs_upgrade_up_to_date_is_noop() -> Result<()> {
    let tmp = TempDir::new()?;
    let upstream = RepoFixture::init(tmp.path().join("upstream"))?;
    let expect = upstream.stage_and_commit(".dots.yml", "name: John/dots\n")?;

    let vcs = Git2Vcs::default();
    let dest = tmp.path().join("clone");
    vcs.clone_repo(&url_of(tmp.path().join("upstream")), &dest)?;
    vcs.upgrade(&dest)?;

    assert_eq!(RepoFixture::open(&dest)?.head()?, expect);

    Ok(())
}

#[test]
fn git2_vcs_upgrade_refuses_diverged_branch() -> Result<()> {
    let tmp = TempDir::new()?;
    let upstream = RepoFixture::init(tmp.path().join("upstream"))?;
    upstream.stage_and_commit(".dots.yml", "name: John/dots\n")?;

    let vcs = Git2Vcs::default();
    let dest = tmp.path().join("clone");
    vcs.clone_repo(&url_of(tmp.path().join("upstream")), &dest)?;

    upstream.stage_and_commit("upstream.txt", "upstream\n")?;
    let local = RepoFixture::open(&dest)?;
    let expect = local.stage_and_commit("local.txt", "local\n")?;

    let result = vcs.upgrade(&dest);
    assert!(matches!(
        result,
        Err(VcsError::NotFastForward { ref branch, .. }) if branch == "main"
    ));
    assert_eq!(local.head()?, expect);

    Ok(())
}

#[test]
fn git2_vcs_upgrade_refuses_detached_head() -> Result<()> {
    let tmp = TempDir::new()?;
    let upstream = RepoFixture::init(tmp.path().join("upstream"))?;
    upstream.stage_and_commit(".dots.yml", "name: John/dots\n")?;

    let vcs = Git2Vcs::default();
    let dest = tmp.path().join("clone");
    vcs.clone_repo(&url_of(tmp.path().join("upstream")), &dest)?;
    RepoFixture::open(&dest)?.detach()?;

    let result = vcs.upgrade(&dest);
    assert!(matches!(result, Err(VcsError::DetachedHead { .. })));

    Ok(())
}

#[test]
fn git2_vcs_upgrade_rejects_non_repository() -> Result<()> {
    let tmp = TempDir::new()?;
    let result = Git2Vcs::default().upgrade(tmp.path());
    assert!(matches!(result, Err(VcsError::Git2(..))));

    Ok(())
}
