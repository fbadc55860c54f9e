//! Builder tests, compiled with the ANSI grammar unless noted.

use crate::query::{BindingType, JoinKind, QueryBuilder, StatementKind, WhereArgs};
use crate::value::{Param, Value, raw};
use crate::{Dialect, table};

fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().map(|n| Value::Int(*n)).collect()
}

#[test]
fn test_select_all_by_default() {
    let q = table(Dialect::Ansi, "users");
    assert_eq!(q.to_sql().unwrap(), r#"select * from "users""#);
    assert!(q.columns().is_none());
}

#[test]
fn test_missing_table_is_compile_error() {
    let q = QueryBuilder::for_dialect(Dialect::Ansi);
    let err = q.compile().unwrap_err();
    assert!(err.is_compile());
    assert_eq!(
        err.to_string(),
        "SQL compile error: cannot compile select statement without a table"
    );
}

#[test]
fn test_leading_boolean_is_stripped() {
    let mut q = table(Dialect::Ansi, "users");
    q.where_(("a", "=", 1)).or_where(("b", "=", 2));

    let built = q.compile().unwrap();
    assert_eq!(
        built.sql,
        r#"select * from "users" where "a" = ? or "b" = ?"#
    );
    assert_eq!(built.bindings, ints(&[1, 2]));
}

#[test]
fn test_two_arg_where_defaults_to_equals() {
    let mut q = table(Dialect::Ansi, "users");
    q.where_(("name", "john"));
    let built = q.compile().unwrap();
    assert_eq!(built.sql, r#"select * from "users" where "name" = ?"#);
    assert_eq!(built.bindings, vec![Value::Text("john".into())]);
}

#[test]
fn test_unknown_operator_is_taken_as_value() {
    let mut q = table(Dialect::Ansi, "users");
    q.where_(("name", "john", 5));
    let built = q.compile().unwrap();
    assert_eq!(built.sql, r#"select * from "users" where "name" = ?"#);
    assert_eq!(built.bindings, vec![Value::Text("john".into())]);
}

#[test]
fn test_operator_is_case_insensitive() {
    let mut q = table(Dialect::Ansi, "users");
    q.where_(("name", "LIKE", "j%"));
    assert_eq!(
        q.to_sql().unwrap(),
        r#"select * from "users" where "name" like ?"#
    );
}

#[test]
fn test_null_value_becomes_null_check() {
    let mut q = table(Dialect::Ansi, "users");
    q.where_(("deleted_at", None::<i64>))
        .where_(("banned_at", "<>", None::<i64>));
    let built = q.compile().unwrap();
    assert_eq!(
        built.sql,
        r#"select * from "users" where "deleted_at" is null and "banned_at" is not null"#
    );
    assert!(built.bindings.is_empty());
}

#[test]
fn test_null_with_ordering_operator_is_rejected() {
    let mut q = table(Dialect::Ansi, "users");
    q.where_(("age", ">", None::<i64>)).where_(("id", 1));

    let err = q.compile().unwrap_err();
    assert!(err.is_invalid_operator());
    assert!(q.validate().is_err());
}

#[test]
fn test_nested_where_is_parenthesized() {
    let mut q = table(Dialect::Ansi, "users");
    q.where_(("active", 1)).where_(WhereArgs::closure(|q| {
        q.where_(("a", 1)).or_where(("b", 2));
    }));

    let built = q.compile().unwrap();
    assert_eq!(
        built.sql,
        r#"select * from "users" where "active" = ? and ("a" = ? or "b" = ?)"#
    );
    assert_eq!(built.bindings, ints(&[1, 1, 2]));
}

#[test]
fn test_empty_nested_group_is_dropped() {
    let mut q = table(Dialect::Ansi, "users");
    q.where_nested(|_| {}).where_(("id", 1));
    assert_eq!(q.to_sql().unwrap(), r#"select * from "users" where "id" = ?"#);
}

#[test]
fn test_map_where_pairs_share_group_boolean() {
    let mut q = table(Dialect::Ansi, "users");
    q.where_(("id", ">", 10))
        .or_where(vec![("status", "active"), ("role", "admin")]);

    let built = q.compile().unwrap();
    assert_eq!(
        built.sql,
        r#"select * from "users" where "id" > ? or ("status" = ? or "role" = ?)"#
    );
    assert_eq!(
        built.bindings,
        vec![
            Value::Int(10),
            Value::Text("active".into()),
            Value::Text("admin".into())
        ]
    );
}

#[test]
fn test_map_where_with_and_is_and_group() {
    let mut q = table(Dialect::Ansi, "users");
    q.where_(("id", 1)).where_(vec![("a", 2), ("b", 3)]);

    let built = q.compile().unwrap();
    assert_eq!(
        built.sql,
        r#"select * from "users" where "id" = ? and ("a" = ? and "b" = ?)"#
    );
    assert_eq!(built.bindings, ints(&[1, 2, 3]));
}

#[test]
fn test_nested_group_keeps_only_predicate_bindings() {
    let mut q = table(Dialect::Ansi, "users");
    q.where_nested(|n| {
        n.join_with(JoinKind::Inner, "j", |j| {
            j.on("j.id", "=", "users.j_id").where_(("j.k", 7));
        })
        .select_raw("? as s", ints(&[8]))
        .order_by_raw("field(a, ?)", ints(&[9]))
        .where_(("a", 1));
    })
    .where_(("b", 2));

    let built = q.compile().unwrap();
    assert_eq!(
        built.sql,
        r#"select * from "users" where ("a" = ?) and "b" = ?"#
    );
    assert_eq!(built.bindings, ints(&[1, 2]));

    let mut q = table(Dialect::Ansi, "users");
    q.where_nested(|n| {
        n.join_with(JoinKind::Inner, "j", |j| {
            j.on("j.id", "=", "users.j_id").where_(("j.k", 7));
        });
    });
    let built = q.compile().unwrap();
    assert_eq!(built.sql, r#"select * from "users""#);
    assert!(built.bindings.is_empty());
}

#[test]
fn test_empty_in_lists() {
    let mut q = table(Dialect::Ansi, "users");
    q.where_in("id", Vec::<i64>::new());
    assert_eq!(q.to_sql().unwrap(), r#"select * from "users" where 0 = 1"#);

    let mut q = table(Dialect::Ansi, "users");
    q.where_not_in("id", Vec::<i64>::new());
    let built = q.compile().unwrap();
    assert_eq!(built.sql, r#"select * from "users" where 1 = 1"#);
    assert!(built.bindings.is_empty());
}

#[test]
fn test_where_in_binds_each_value() {
    let mut q = table(Dialect::Ansi, "users");
    q.where_in("id", [1, 2, 3]).or_where_not_in("role", ["guest"]);

    let built = q.compile().unwrap();
    assert_eq!(
        built.sql,
        r#"select * from "users" where "id" in (?, ?, ?) or "role" not in (?)"#
    );
    assert_eq!(built.bindings.len(), 4);
}

#[test]
fn test_expressions_are_never_bound() {
    let mut q = table(Dialect::Ansi, "users");
    q.where_(("created_at", "<", raw("now()")))
        .where_in("id", [Param::from(1), Param::from(raw("7"))]);

    let built = q.compile().unwrap();
    assert_eq!(
        built.sql,
        r#"select * from "users" where "created_at" < now() and "id" in (?, 7)"#
    );
    assert_eq!(built.bindings, ints(&[1]));
}

#[test]
fn test_between() {
    let mut q = table(Dialect::Ansi, "users");
    q.where_between("age", 18, 30).or_where_not_between("score", 1, 2);

    let built = q.compile().unwrap();
    assert_eq!(
        built.sql,
        r#"select * from "users" where "age" between ? and ? or "score" not between ? and ?"#
    );
    assert_eq!(built.bindings, ints(&[18, 30, 1, 2]));
}

#[test]
fn test_exists_bindings_are_spliced_in_place() {
    let mut q = table(Dialect::Ansi, "users");
    q.where_(("a", 1))
        .where_exists(|s| {
            s.from("orders")
                .where_column("orders.user_id", "=", "users.id")
                .where_(("orders.total", ">", 10));
        })
        .where_(("b", 2));

    let built = q.compile().unwrap();
    assert_eq!(
        built.sql,
        r#"select * from "users" where "a" = ? and exists (select * from "orders" where "orders"."user_id" = "users"."id" and "orders"."total" > ?) and "b" = ?"#
    );
    assert_eq!(built.bindings, ints(&[1, 10, 2]));
}

#[test]
fn test_where_in_sub_and_where_sub() {
    let mut q = table(Dialect::Ansi, "users");
    q.where_in_sub("id", |s| {
        s.from("bans").select(["user_id"]).where_(("active", 1));
    })
    .where_sub("score", ">", |s| {
        s.from("scores").select_raw("avg(score)", vec![]);
    });

    let built = q.compile().unwrap();
    assert_eq!(
        built.sql,
        r#"select * from "users" where "id" in (select "user_id" from "bans" where "active" = ?) and "score" > (select avg(score) from "scores")"#
    );
    assert_eq!(built.bindings, ints(&[1]));
}

#[test]
fn test_or_where_sub() {
    let mut q = table(Dialect::Ansi, "users");
    q.where_(("active", 1)).or_where_sub("score", ">=", |s| {
        s.from("scores").select_raw("max(score)", vec![]).where_(("season", 3));
    });

    let built = q.compile().unwrap();
    assert_eq!(
        built.sql,
        r#"select * from "users" where "active" = ? or "score" >= (select max(score) from "scores" where "season" = ?)"#
    );
    assert_eq!(built.bindings, ints(&[1, 3]));

    let mut q = table(Dialect::Ansi, "users");
    q.or_where_sub("score", "sideways", |s| {
        s.from("scores");
    });
    assert!(q.compile().unwrap_err().is_invalid_operator());
}

#[test]
fn test_not_exists() {
    let mut q = table(Dialect::Ansi, "users");
    q.where_not_exists(|s| {
        s.from("bans").where_column("bans.user_id", "=", "users.id");
    });
    assert_eq!(
        q.to_sql().unwrap(),
        r#"select * from "users" where not exists (select * from "bans" where "bans"."user_id" = "users"."id")"#
    );
}

#[test]
fn test_join_bindings_precede_where_bindings() {
    let mut q = table(Dialect::Ansi, "users");
    q.where_(("users.id", 7))
        .join_with(JoinKind::Left, "posts", |j| {
            j.on("users.id", "=", "posts.user_id")
                .where_(("posts.published", 1));
        });

    let built = q.compile().unwrap();
    assert_eq!(
        built.sql,
        r#"select * from "users" left join "posts" on "users"."id" = "posts"."user_id" and "posts"."published" = ? where "users"."id" = ?"#
    );
    assert_eq!(built.bindings, ints(&[1, 7]));
    assert_eq!(q.bindings_for(BindingType::Join), ints(&[1]).as_slice());
}

#[test]
fn test_nested_join_predicates_use_on() {
    let mut q = table(Dialect::Ansi, "a");
    q.join_with(JoinKind::Inner, "b", |j| {
        j.on("a.id", "=", "b.a_id").on_nested(|n| {
            n.where_(("b.x", 1)).or_where(("b.y", 2));
        });
    });

    let built = q.compile().unwrap();
    assert_eq!(
        built.sql,
        r#"select * from "a" inner join "b" on "a"."id" = "b"."a_id" and ("b"."x" = ? or "b"."y" = ?)"#
    );
    assert_eq!(built.bindings, ints(&[1, 2]));
}

#[test]
fn test_join_shorthands() {
    let mut q = table(Dialect::Ansi, "users as u");
    q.select(["u.name as n"])
        .join("posts as p", "u.id", "=", "p.user_id")
        .right_join("teams", "u.team_id", "=", "teams.id")
        .cross_join("colors");

    assert_eq!(
        q.to_sql().unwrap(),
        r#"select "u"."name" as "n" from "users" as "u" inner join "posts" as "p" on "u"."id" = "p"."user_id" right join "teams" on "u"."team_id" = "teams"."id" cross join "colors""#
    );
}

#[test]
fn test_select_raw_bindings_come_first() {
    let mut q = table(Dialect::Ansi, "users");
    q.where_(("id", 3))
        .select(["id"])
        .select_raw("coalesce(score, ?) as s", vec![Value::Int(0)]);

    let built = q.compile().unwrap();
    assert_eq!(
        built.sql,
        r#"select "id", coalesce(score, ?) as s from "users" where "id" = ?"#
    );
    assert_eq!(built.bindings, ints(&[0, 3]));
}

#[test]
fn test_select_sub() {
    let mut q = table(Dialect::Ansi, "users");
    q.select(["id"]).select_sub("posts", |s| {
        s.from("posts")
            .select_raw("count(*)", vec![])
            .where_column("posts.user_id", "=", "users.id");
    });

    assert_eq!(
        q.to_sql().unwrap(),
        r#"select "id", (select count(*) from "posts" where "posts"."user_id" = "users"."id") as "posts" from "users""#
    );
}

#[test]
fn test_group_having_order() {
    let mut q = table(Dialect::Ansi, "orders");
    q.select(["status"])
        .select_raw("count(*) as total", vec![])
        .group_by(["status"])
        .having("total", ">", 3)
        .or_having_raw("sum(amount) > ?", vec![Value::Int(100)])
        .order_by("status", "DESC")
        .order_by_raw("field(status, ?)", vec![Value::Text("new".into())]);

    let built = q.compile().unwrap();
    assert_eq!(
        built.sql,
        r#"select "status", count(*) as total from "orders" group by "status" having "total" > ? or sum(amount) > ? order by "status" desc, field(status, ?)"#
    );
    assert_eq!(
        built.bindings,
        vec![Value::Int(3), Value::Int(100), Value::Text("new".into())]
    );
}

#[test]
fn test_having_between() {
    let mut q = table(Dialect::Ansi, "orders");
    q.group_by(["user_id"]).having_between("total", 1, 10);
    let built = q.compile().unwrap();
    assert_eq!(
        built.sql,
        r#"select * from "orders" group by "user_id" having "total" between ? and ?"#
    );
    assert_eq!(built.bindings, ints(&[1, 10]));
}

#[test]
fn test_invalid_order_direction() {
    let mut q = table(Dialect::Ansi, "users");
    q.order_by("id", "sideways");
    assert!(q.compile().unwrap_err().is_compile());
}

#[test]
fn test_latest_oldest() {
    let mut q = table(Dialect::Ansi, "posts");
    q.latest("created_at").oldest("id");
    assert_eq!(
        q.to_sql().unwrap(),
        r#"select * from "posts" order by "created_at" desc, "id" asc"#
    );
}

#[test]
fn test_limit_offset_and_for_page() {
    let mut q = table(Dialect::Ansi, "users");
    q.for_page(3, 15);
    assert_eq!(
        q.to_sql().unwrap(),
        r#"select * from "users" limit 15 offset 30"#
    );

    let mut q = table(Dialect::Ansi, "users");
    q.for_page(0, 10);
    assert_eq!(q.page().offset, Some(0));

    let mut q = table(Dialect::Ansi, "users");
    q.take(0);
    assert_eq!(q.to_sql().unwrap(), r#"select * from "users" limit 0"#);
}

#[test]
fn test_union_redirects_order_and_limit() {
    let mut q = table(Dialect::Ansi, "a");
    q.limit(5);

    let mut other = table(Dialect::Ansi, "b");
    other.where_(("x", 1));

    q.union(other).order_by_desc("id").limit(10);

    assert_eq!(q.page().limit, Some(5));
    assert_eq!(q.union_page().limit, Some(10));
    assert!(q.orders().is_empty());
    assert_eq!(q.union_orders().len(), 1);

    let built = q.compile().unwrap();
    assert_eq!(
        built.sql,
        r#"select * from "a" limit 5 union select * from "b" where "x" = ? order by "id" desc limit 10"#
    );
    assert_eq!(built.bindings, ints(&[1]));
}

#[test]
fn test_union_bindings_follow_where_bindings() {
    let mut q = table(Dialect::Ansi, "a");
    q.union_with(true, |u| {
        u.from("b").where_(("y", 2));
    });
    q.where_(("x", 1));

    let built = q.compile().unwrap();
    assert_eq!(
        built.sql,
        r#"select * from "a" where "x" = ? union all select * from "b" where "y" = ?"#
    );
    assert_eq!(built.bindings, ints(&[1, 2]));
}

#[test]
fn test_union_order_bindings_follow_later_union_arms() {
    let mut q = table(Dialect::Ansi, "a");
    q.union_with(false, |u| {
        u.from("b").where_(("x", 1));
    })
    .order_by_raw("field(id, ?)", ints(&[99]))
    .union_with(false, |u| {
        u.from("c").where_(("y", 2));
    });

    let built = q.compile().unwrap();
    assert_eq!(
        built.sql,
        r#"select * from "a" union select * from "b" where "x" = ? union select * from "c" where "y" = ? order by field(id, ?)"#
    );
    assert_eq!(built.bindings, ints(&[1, 2, 99]));
    assert_eq!(q.bindings_for(BindingType::Union), ints(&[1, 2, 99]).as_slice());
}

#[test]
fn test_compile_is_idempotent() {
    let mut q = table(Dialect::Ansi, "users");
    q.where_(("a", 1))
        .where_in("b", [2, 3])
        .order_by_desc("c")
        .limit(4);

    let first = q.compile().unwrap();
    let second = q.compile().unwrap();
    assert_eq!(first, second);
    assert!(q.columns().is_none());
}

#[test]
fn test_when() {
    let mut q = table(Dialect::Ansi, "users");
    q.when(false, |q| {
        q.where_(("a", 1));
    })
    .when(true, |q| {
        q.where_(("b", 2));
    });
    assert_eq!(q.to_sql().unwrap(), r#"select * from "users" where "b" = ?"#);
}

#[test]
fn test_count_query_strips_columns_and_orders() {
    let mut q = table(Dialect::Ansi, "users");
    q.select(["id", "name"])
        .select_raw("?", vec![Value::Int(9)])
        .where_(("a", 1))
        .order_by_raw("field(id, ?)", vec![Value::Int(5)]);

    let count = q.count_query();
    let built = count.compile().unwrap();
    assert_eq!(
        built.sql,
        r#"select count(*) as aggregate from "users" where "a" = ?"#
    );
    assert_eq!(built.bindings, ints(&[1]));

    // source builder untouched
    assert_eq!(q.columns().map(|c| c.len()), Some(3));
    assert_eq!(q.get_bindings(), ints(&[9, 1, 5]));
}

#[test]
fn test_aggregate_keeps_orders_with_groups() {
    let mut q = table(Dialect::Ansi, "orders");
    q.group_by(["user_id"]).order_by_asc("user_id");
    assert_eq!(
        q.max_query("total").to_sql().unwrap(),
        r#"select max("total") as aggregate from "orders" group by "user_id" order by "user_id" asc"#
    );
}

#[test]
fn test_distinct_aggregate() {
    let mut q = table(Dialect::Ansi, "users");
    q.distinct();
    assert_eq!(
        q.to_aggregate("count", &["email"]).to_sql().unwrap(),
        r#"select count(distinct "email") as aggregate from "users""#
    );
}

#[test]
fn test_union_aggregate_uses_temp_table() {
    let mut q = table(Dialect::Ansi, "a");
    let mut other = table(Dialect::Ansi, "b");
    other.where_(("x", 1));
    q.union(other);

    let built = q.count_query().compile().unwrap();
    assert_eq!(
        built.sql,
        r#"select count(*) as aggregate from (select * from "a" union select * from "b" where "x" = ?) as "temp_table""#
    );
    assert_eq!(built.bindings, ints(&[1]));
}

#[test]
fn test_insert_with_columns_and_values() {
    let mut q = table(Dialect::Ansi, "user");
    q.insert_columns(["name", "age"])
        .values([Param::from("a"), Param::from(1)]);

    let built = q.compile().unwrap();
    assert_eq!(q.statement_kind(), StatementKind::Insert);
    assert_eq!(
        built.sql,
        r#"insert into "user" ("name", "age") values (?, ?)"#
    );
    assert_eq!(built.bindings, vec![Value::Text("a".into()), Value::Int(1)]);
}

#[test]
fn test_insert_rows_are_matched_by_column() {
    let mut q = table(Dialect::Ansi, "t");
    q.insert([("a", 1), ("b", 2)]).insert([("b", 4), ("a", 3)]);

    let built = q.compile().unwrap();
    assert_eq!(
        built.sql,
        r#"insert into "t" ("a", "b") values (?, ?), (?, ?)"#
    );
    assert_eq!(built.bindings, ints(&[1, 2, 3, 4]));
}

#[test]
fn test_insert_missing_column_binds_null() {
    let mut q = table(Dialect::Ansi, "t");
    q.insert([("a", 1), ("b", 2)]).insert([("a", 3)]);
    let built = q.compile().unwrap();
    assert_eq!(
        built.bindings,
        vec![Value::Int(1), Value::Int(2), Value::Int(3), Value::Null]
    );
}

#[test]
fn test_insert_unknown_column_is_rejected() {
    let mut q = table(Dialect::Ansi, "t");
    q.insert([("a", 1)]).insert([("z", 3)]);
    assert!(q.compile().unwrap_err().is_compile());
}

#[test]
fn test_empty_insert_is_rejected() {
    let mut q = table(Dialect::Ansi, "t");
    q.insert_columns(["a"]);
    assert!(q.compile().unwrap_err().is_compile());

    let mut q = table(Dialect::Ansi, "t");
    q.insert(Vec::<(&str, i64)>::new());
    assert!(q.compile().unwrap_err().is_compile());
}

#[test]
fn test_update_set_then_where() {
    let mut q = table(Dialect::Ansi, "user");
    q.update([("name", "x")]).where_(("id", 5));

    let built = q.compile().unwrap();
    assert_eq!(built.sql, r#"update "user" set "name" = ? where "id" = ?"#);
    assert_eq!(built.bindings, vec![Value::Text("x".into()), Value::Int(5)]);
}

#[test]
fn test_update_without_values_is_rejected() {
    let mut q = table(Dialect::Ansi, "user");
    q.update(Vec::<(&str, i64)>::new());
    assert!(q.compile().unwrap_err().is_compile());
}

#[test]
fn test_delete() {
    let mut q = table(Dialect::Ansi, "user");
    q.where_(("id", 5)).delete();
    let built = q.compile().unwrap();
    assert_eq!(built.sql, r#"delete from "user" where "id" = ?"#);
    assert_eq!(built.bindings, ints(&[5]));
}

#[test]
fn test_bindings_by_name() {
    let mut q = table(Dialect::Ansi, "users");
    q.where_(("id", 1));
    assert_eq!(q.bindings_named("where").unwrap(), ints(&[1]).as_slice());
    assert!(q.bindings_named("limit").unwrap_err().is_compile());
}

#[test]
fn test_new_query_shares_table_and_grammar() {
    let q = table(Dialect::MySql, "users");
    let fresh = q.new_query();
    assert_eq!(fresh.table().map(|t| t.as_str()), Some("users"));
    assert_eq!(fresh.dialect(), Dialect::MySql);
    assert!(fresh.wheres().is_empty());
}
