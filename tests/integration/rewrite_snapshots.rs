//! Snapshot tests for rendered rewrites.
//!
//! Run `cargo insta review` to review changes.

use ctxfirst::canonicalize_source;
use ctxfirst::handles::HandleTypeSet;
use insta::assert_snapshot;

fn rewrite(src: &str) -> String {
    let (out, changed) = canonicalize_source(src, &HandleTypeSet::default()).unwrap();
    assert!(changed);
    out
}

#[test]
fn service_with_interface_methods_and_literals() {
    let src = r#"package app

import (
	"context"
	"fmt"
)

// Repo stores users.
type Repo interface {
	Find(id int, ctx context.Context) (string, error)
	Close() error
}

type Service struct {
	repo Repo
}

// Lookup finds a user.
func (s *Service) Lookup(id int, ctx context.Context) (string, error) {
	name, err := s.repo.Find(id, ctx)
	if err != nil {
		return "", fmt.Errorf("lookup %d: %w", id, err)
	}
	return name, nil
}

func handler(s *Service) func(string, context.Context) error {
	return func(name string, ctx context.Context) error {
		_, err := s.Lookup(len(name), ctx)
		return err
	}
}
"#;
    assert_snapshot!(rewrite(src), @r#"
package app

import (
	"context"
	"fmt"
)

// Repo stores users.
type Repo interface {
	Find(ctx context.Context, id int) (string, error)
	Close() error
}

type Service struct {
	repo Repo
}

// Lookup finds a user.
func (s *Service) Lookup(ctx context.Context, id int) (string, error) {
	name, err := s.repo.Find(ctx, id)
	if err != nil {
		return "", fmt.Errorf("lookup %d: %w", id, err)
	}
	return name, nil
}

func handler(s *Service) func(string, context.Context) error {
	return func(ctx context.Context, name string) error {
		_, err := s.Lookup(ctx, len(name))
		return err
	}
}
"#);
}

#[test]
fn multiline_lists_keep_their_comments_in_place() {
    let src = r#"package app

import "context"

func send(
	msg string, // payload
	ctx context.Context,
) error {
	return nil
}

func run(ctx context.Context) error {
	return send(
		"hello", /* greeting */
		ctx,
	)
}
"#;
    assert_snapshot!(rewrite(src), @r#"
package app

import "context"

func send(
	ctx context.Context, // payload
	msg string,
) error {
	return nil
}

func run(ctx context.Context) error {
	return send(
		ctx, /* greeting */
		"hello",
	)
}
"#);
}
