// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! For-each lowering tests: strategy choice, emitted shape, bookkeeping.

#[cfg(test)]
mod tests {
    use brook_ast::{BinOp, Expr, Span, Stmt};
    use brook_ir::{runtime, Dispatch, Instruction, JumpCond, Label, MethodCode};
    use brook_types::{well_known, PrimitiveKind, StaticType, TypeDef, TypeTable};

    use crate::foreach::scope::LoopScope;
    use crate::{
        find_iterator_method, lower_method, select_strategy, BasicExprLowering, ForEachStrategy,
        InternalFault, LocalTypeResolver, LoweringConfig, LoweringError, MethodLowerer,
    };

    // ── Fixtures ────────────────────────────────────────────────

    fn iterator_ty() -> StaticType {
        StaticType::named(well_known::ITERATOR)
    }

    fn int_array() -> StaticType {
        StaticType::array_of(StaticType::int())
    }

    fn table() -> TypeTable {
        let mut t = TypeTable::new();
        t.define(TypeDef::class("Bag").method("iterator", vec![], iterator_ty()))
            .unwrap();
        t.define(TypeDef::class("SubBag").extends("Bag")).unwrap();
        t.define(TypeDef::class("Shelf").implements(well_known::ITERABLE))
            .unwrap();
        t.define(
            TypeDef::class("Odd")
                .implements(well_known::ITERABLE)
                .method("iterator", vec![], StaticType::object()),
        )
        .unwrap();
        t.define(TypeDef::class("Plain")).unwrap();
        t.define(TypeDef::class("Tokens").implements(well_known::ENUMERATOR))
            .unwrap();

        // Two unrelated interfaces both offering iterator().
        t.define(TypeDef::interface("Rows").method("iterator", vec![], iterator_ty()))
            .unwrap();
        t.define(TypeDef::interface("Cols").method("iterator", vec![], iterator_ty()))
            .unwrap();
        t.define(TypeDef::class("Grid").implements("Rows").implements("Cols"))
            .unwrap();
        // Depth-first: Deep reaches Rows through Wrapper before Cols.
        t.define(TypeDef::interface("Wrapper").implements("Rows")).unwrap();
        t.define(TypeDef::class("Deep").implements("Wrapper").implements("Cols"))
            .unwrap();
        t
    }

    fn params(list: &[(&str, StaticType)]) -> Vec<(String, StaticType)> {
        list.iter().map(|(n, t)| (n.to_string(), t.clone())).collect()
    }

    fn lower_with(
        types: &TypeTable,
        config: &LoweringConfig,
        list: &[(&str, StaticType)],
        body: Stmt,
    ) -> Result<MethodCode, LoweringError> {
        lower_method(types, config, StaticType::named("Main"), &params(list), &body)
    }

    fn lower(list: &[(&str, StaticType)], body: Stmt) -> MethodCode {
        lower_with(&table(), &LoweringConfig::default(), list, body).unwrap()
    }

    /// `for (ty x : c) {}` inside a block.
    fn empty_loop(ty: StaticType) -> Stmt {
        Stmt::block(vec![Stmt::for_each("x", ty, Expr::local("c"), Stmt::block(vec![]))])
    }

    fn invokes(code: &MethodCode) -> Vec<String> {
        code.instructions
            .iter()
            .filter_map(|i| match i {
                Instruction::Invoke { method, .. } => Some(format!("{}.{}", method.owner, method.name)),
                _ => None,
            })
            .collect()
    }

    // ═══════════════════════════════════════════════════════════
    // Strategy selection
    // ═══════════════════════════════════════════════════════════

    #[test]
    fn exact_component_match_indexes_the_array() {
        let t = table();
        assert_eq!(
            select_strategy(&t, &int_array(), &StaticType::int()),
            ForEachStrategy::IndexedArray
        );
        let strings = StaticType::array_of(StaticType::named("String"));
        assert_eq!(
            select_strategy(&t, &strings, &StaticType::named("String")),
            ForEachStrategy::IndexedArray
        );
    }

    #[test]
    fn widening_or_boxing_does_not_index() {
        let t = table();
        assert_eq!(
            select_strategy(&t, &int_array(), &StaticType::object()),
            ForEachStrategy::Iterator
        );
        assert_eq!(
            select_strategy(&t, &int_array(), &StaticType::primitive(PrimitiveKind::Long)),
            ForEachStrategy::Iterator
        );
        let strings = StaticType::array_of(StaticType::named("String"));
        assert_eq!(
            select_strategy(&t, &strings, &StaticType::object()),
            ForEachStrategy::Iterator
        );
    }

    #[test]
    fn enumerators_are_recognised_through_implementation() {
        let t = table();
        assert_eq!(
            select_strategy(&t, &StaticType::named("Tokens"), &StaticType::object()),
            ForEachStrategy::Enumerator
        );
        assert_eq!(
            select_strategy(&t, &StaticType::named(well_known::ENUMERATOR), &StaticType::object()),
            ForEachStrategy::Enumerator
        );
        assert_eq!(
            select_strategy(&t, &StaticType::named("Shelf"), &StaticType::object()),
            ForEachStrategy::Iterator
        );
        assert_eq!(
            select_strategy(&t, &StaticType::Null, &StaticType::object()),
            ForEachStrategy::Iterator
        );
    }

    // ═══════════════════════════════════════════════════════════
    // Iterator method search
    // ═══════════════════════════════════════════════════════════

    fn found(t: &TypeTable, ty: &str) -> Option<String> {
        find_iterator_method(t, &StaticType::named(ty)).map(|m| m.owner.clone())
    }

    #[test]
    fn declared_and_superclass_methods_are_direct() {
        let t = table();
        assert_eq!(found(&t, "Bag").as_deref(), Some("Bag"));
        assert_eq!(found(&t, "SubBag").as_deref(), Some("Bag"));
    }

    #[test]
    fn inherited_interface_method_is_found() {
        let t = table();
        assert_eq!(found(&t, "Shelf").as_deref(), Some(well_known::ITERABLE));
        assert_eq!(found(&t, well_known::ITERABLE).as_deref(), Some(well_known::ITERABLE));
    }

    #[test]
    fn non_iterator_return_does_not_shadow() {
        let t = table();
        assert_eq!(found(&t, "Odd").as_deref(), Some(well_known::ITERABLE));
    }

    #[test]
    fn tie_break_follows_declaration_order_depth_first() {
        let t = table();
        assert_eq!(found(&t, "Grid").as_deref(), Some("Rows"));
        assert_eq!(found(&t, "Deep").as_deref(), Some("Rows"));
    }

    #[test]
    fn nothing_iterable_means_coercion() {
        let t = table();
        assert_eq!(found(&t, "Plain"), None);
        assert_eq!(find_iterator_method(&t, &int_array()), None);
        assert_eq!(found(&t, "Undeclared"), None);
    }

    // ═══════════════════════════════════════════════════════════
    // Emitted shape
    // ═══════════════════════════════════════════════════════════

    #[test]
    fn int_array_sum_listing() {
        // int sum; for (int x : a) { sum += x; }
        let body = Stmt::block(vec![
            Stmt::local("sum", StaticType::int(), None),
            Stmt::for_each(
                "x",
                StaticType::int(),
                Expr::local("a"),
                Stmt::block(vec![Stmt::compound("sum", BinOp::Add, Expr::local("x"))]),
            ),
        ]);
        let code = lower(&[("a", int_array())], body);
        assert_eq!(
            code.to_string(),
            "max_locals=6 max_stack=2\n\
             \x20   iconst 0\n\
             \x20   istore #1\n\
             \x20   aload #0\n\
             \x20   dup\n\
             \x20   astore #3\n\
             \x20   ifnull L1\n\
             \x20   aload #3\n\
             \x20   arraylength\n\
             \x20   istore #4\n\
             \x20   iconst 0\n\
             \x20   istore #5\n\
             L0:\n\
             \x20   iload #5\n\
             \x20   iload #4\n\
             \x20   if_icmpge L1\n\
             \x20   aload #3\n\
             \x20   iload #5\n\
             \x20   iaload\n\
             \x20   istore #2\n\
             \x20   iinc #5 1\n\
             \x20   iload #1\n\
             \x20   iload #2\n\
             \x20   iadd\n\
             \x20   istore #1\n\
             \x20   goto L0\n\
             L1:\n"
        );
    }

    #[test]
    fn element_load_matches_declared_type() {
        let cases = [
            (PrimitiveKind::Long, "laload", "lstore #1"),
            (PrimitiveKind::Boolean, "baload", "istore #1"),
            (PrimitiveKind::Byte, "baload", "istore #1"),
            (PrimitiveKind::Char, "caload", "istore #1"),
            (PrimitiveKind::Short, "saload", "istore #1"),
            (PrimitiveKind::Float, "faload", "fstore #1"),
            (PrimitiveKind::Double, "daload", "dstore #1"),
        ];
        for (kind, load, store) in cases {
            let elem = StaticType::primitive(kind);
            let code = lower(&[("c", StaticType::array_of(elem.clone()))], empty_loop(elem));
            let text = code.to_string();
            let at = text.find(load).unwrap_or_else(|| panic!("{} missing:\n{}", load, text));
            assert!(text[at..].starts_with(&format!("{}\n    {}", load, store)), "{}", text);
        }
        let strings = StaticType::array_of(StaticType::named("String"));
        let code = lower(&[("c", strings)], empty_loop(StaticType::named("String")));
        assert!(code.to_string().contains("aaload\n    astore #1"));
    }

    #[test]
    fn enumerator_loop_calls_the_protocol() {
        let code = lower(&[("c", StaticType::named("Tokens"))], empty_loop(StaticType::object()));
        assert_eq!(
            invokes(&code),
            vec!["Enumerator.hasMoreElements", "Enumerator.nextElement"]
        );
        assert!(code
            .instructions
            .iter()
            .all(|i| !matches!(i, Instruction::CheckCast(_))));
    }

    #[test]
    fn narrower_variable_is_cast_and_primitive_is_unboxed() {
        let code = lower(&[("c", StaticType::named("Bag"))], empty_loop(StaticType::named("String")));
        assert!(code
            .instructions
            .contains(&Instruction::CheckCast("String".into())));

        let code = lower(&[("c", StaticType::named("Tokens"))], empty_loop(StaticType::int()));
        assert!(code
            .instructions
            .contains(&Instruction::invoke(runtime::unbox_primitive(PrimitiveKind::Int))));
    }

    #[test]
    fn direct_iterator_call_binds_statically() {
        let code = lower(&[("c", StaticType::named("SubBag"))], empty_loop(StaticType::object()));
        let first = code
            .instructions
            .iter()
            .find_map(|i| match i {
                Instruction::Invoke { dispatch, method } => Some((*dispatch, method.clone())),
                _ => None,
            })
            .unwrap();
        assert_eq!(first.0, Dispatch::Virtual);
        assert_eq!(first.1.owner, "Bag");
        assert_eq!(invokes(&code)[1..], ["Iterator.hasNext", "Iterator.next"]);
    }

    #[test]
    fn inherited_iterator_uses_interface_dispatch() {
        let code = lower(&[("c", StaticType::named("Shelf"))], empty_loop(StaticType::object()));
        assert!(matches!(
            &code.instructions[1],
            Instruction::Invoke { dispatch: Dispatch::Interface, method }
                if method.owner == well_known::ITERABLE
        ));
    }

    #[test]
    fn missing_iterator_falls_back_to_runtime_coercion() {
        let code = lower(&[("c", StaticType::named("Plain"))], empty_loop(StaticType::object()));
        assert_eq!(
            code.instructions[1],
            Instruction::invoke(runtime::iterator_coercion(
                runtime::DEFAULT_METHODS,
                runtime::ITERATOR_COERCION
            ))
        );

        // for (Object x : intArray) takes the same path
        let code = lower(&[("c", int_array())], empty_loop(StaticType::object()));
        assert_eq!(invokes(&code)[0], format!("{}.iterator", runtime::DEFAULT_METHODS));
        assert!(!code.instructions.contains(&Instruction::ArrayLength));
    }

    #[test]
    fn coercion_routine_comes_from_config() {
        let config = LoweringConfig::from_json(
            r#"{ "runtime_iterator": { "owner": "rt/Iter", "name": "of" } }"#,
        )
        .unwrap();
        let code = lower_with(
            &table(),
            &config,
            &[("c", StaticType::named("Plain"))],
            empty_loop(StaticType::object()),
        )
        .unwrap();
        assert_eq!(invokes(&code)[0], "rt/Iter.of");
    }

    #[test]
    fn known_position_emits_a_line_number_first() {
        let body = Stmt::for_each("x", StaticType::int(), Expr::local("c"), Stmt::block(vec![]))
            .at(Span::new(12, 5));
        let code = lower(&[("c", int_array())], body);
        assert_eq!(code.instructions[0], Instruction::LineNumber(12));
        assert_eq!(code.count(|i| matches!(i, Instruction::LineNumber(_))), 1);
    }

    #[test]
    fn sibling_loops_reuse_slots() {
        let body = Stmt::block(vec![
            Stmt::for_each("x", StaticType::int(), Expr::local("c"), Stmt::block(vec![])),
            Stmt::for_each("y", StaticType::int(), Expr::local("c"), Stmt::block(vec![])),
        ]);
        let code = lower(&[("c", int_array())], body);
        // c, x, $arr, $len, $idx
        assert_eq!(code.max_locals, 5);
    }

    #[test]
    fn nested_loops_stack_their_slots() {
        let grid = StaticType::array_of(int_array());
        let body = Stmt::block(vec![Stmt::for_each(
            "row",
            int_array(),
            Expr::local("c"),
            Stmt::for_each("x", StaticType::int(), Expr::local("row"), Stmt::block(vec![])),
        )]);
        let code = lower(&[("c", grid)], body);
        assert_eq!(code.max_locals, 9);
        assert_eq!(code.count(|i| matches!(i, Instruction::ArrayLength)), 2);
        assert!(code.to_string().contains("aaload\n    astore #1"));
    }

    /// `for (ty x : c) <body>` where the body is one bare statement.
    fn bare_body_loop(ty: StaticType, body: Stmt) -> Stmt {
        Stmt::block(vec![Stmt::for_each("x", ty, Expr::local("c"), body)])
    }

    #[test]
    fn bare_local_in_array_loop_body_is_scoped_to_the_body() {
        let body = bare_body_loop(
            StaticType::int(),
            Stmt::local("y", StaticType::int(), Some(Expr::local("x"))),
        );
        let code = lower(&[("c", int_array())], body);
        // c, x, $arr, $len, $idx, y
        assert_eq!(code.max_locals, 6);
        assert!(code.to_string().contains("istore #5"));
    }

    #[test]
    fn local_under_if_in_array_loop_body_is_scoped_to_the_branch() {
        let body = bare_body_loop(
            StaticType::int(),
            Stmt::if_then(
                Expr::binary(BinOp::Lt, Expr::int(1), Expr::int(2)),
                Stmt::local("y", StaticType::int(), Some(Expr::local("x"))),
            ),
        );
        let code = lower(&[("c", int_array())], body);
        assert_eq!(code.max_locals, 6);
    }

    #[test]
    fn bare_local_in_protocol_loop_bodies_is_scoped_to_the_body() {
        for collection in ["Tokens", "Bag", "Plain"] {
            let body = bare_body_loop(
                StaticType::object(),
                Stmt::local("y", StaticType::object(), Some(Expr::local("x"))),
            );
            let code = lower(&[("c", StaticType::named(collection))], body);
            // c, x, $enum or $iter, y
            assert_eq!(code.max_locals, 4, "{}", collection);
        }
    }

    #[test]
    fn labelled_break_targets_the_outer_loop() {
        let body = Stmt::block(vec![Stmt::for_each(
            "row",
            int_array(),
            Expr::local("c"),
            Stmt::for_each(
                "x",
                StaticType::int(),
                Expr::local("row"),
                Stmt::block(vec![
                    Stmt::continue_(Some("outer")),
                    Stmt::break_(Some("outer")),
                    Stmt::break_(None),
                ]),
            ),
        )
        .labelled("outer")]);
        let code = lower(&[("c", StaticType::array_of(int_array()))], body);
        let jumps: Vec<Label> = code
            .instructions
            .iter()
            .filter_map(|i| match i {
                Instruction::Jump { cond: JumpCond::Always, target } => Some(*target),
                _ => None,
            })
            .collect();
        // continue outer, break outer, break, inner goto, outer goto
        assert_eq!(jumps, vec![Label(0), Label(1), Label(3), Label(2), Label(0)]);
    }

    #[test]
    fn lowering_is_deterministic() {
        let body = || {
            Stmt::block(vec![Stmt::for_each(
                "x",
                StaticType::named("String"),
                Expr::local("c"),
                Stmt::block(vec![Stmt::expr(Expr::local("x"))]),
            )])
        };
        let first = lower(&[("c", StaticType::named("Grid"))], body());
        let second = lower(&[("c", StaticType::named("Grid"))], body());
        assert_eq!(first, second);
    }

    // ═══════════════════════════════════════════════════════════
    // Bookkeeping
    // ═══════════════════════════════════════════════════════════

    fn with_lowerer<R>(types: &TypeTable, config: &LoweringConfig, f: impl FnOnce(&mut MethodLowerer<'_>) -> R) -> R {
        let mut cx = MethodLowerer::new(
            types,
            config,
            &LocalTypeResolver,
            &BasicExprLowering,
            StaticType::named("Main"),
        );
        f(&mut cx)
    }

    #[test]
    fn failed_body_leaves_no_scopes_slots_or_stack() {
        let types = table();
        let config = LoweringConfig::default();
        with_lowerer(&types, &config, |cx| {
            cx.define_parameter("c", int_array()).unwrap();
            let stmt = Stmt::for_each(
                "x",
                StaticType::int(),
                Expr::local("c"),
                Stmt::expr(Expr::local("missing")),
            );
            assert_eq!(
                cx.lower_stmt(&stmt),
                Err(LoweringError::UnresolvedVariable("missing".into()))
            );
            assert_eq!(cx.frame().scope_depth(), 0);
            assert_eq!(cx.frame().live_temporaries(), 0);
            assert_eq!(cx.frame().next_slot(), 1);
            assert_eq!(cx.stack().depth(), 0);
        });
    }

    #[test]
    fn unreleased_temporary_is_an_internal_fault() {
        let types = table();
        let config = LoweringConfig::default();
        with_lowerer(&types, &config, |cx| {
            let mut scope = LoopScope::enter(cx, &[]);
            scope.push_type(StaticType::int());
            scope.store_temporary("$stray", StaticType::int()).unwrap();
            assert_eq!(
                scope.finish(),
                Err(LoweringError::Internal(InternalFault::SlotImbalance {
                    expected: 0,
                    live: 1
                }))
            );
            assert_eq!(cx.frame().scope_depth(), 0);
        });
    }

    #[test]
    fn leftover_stack_value_is_an_internal_fault() {
        let types = table();
        let config = LoweringConfig::default();
        with_lowerer(&types, &config, |cx| {
            let mut scope = LoopScope::enter(cx, &[]);
            scope.push_type(StaticType::object());
            assert_eq!(
                scope.finish(),
                Err(LoweringError::Internal(InternalFault::StackImbalance {
                    expected: 0,
                    actual: 1
                }))
            );
            assert_eq!(cx.stack().depth(), 0);
        });
    }

    #[test]
    fn unverified_scope_pops_leftovers() {
        let types = table();
        let config = LoweringConfig {
            verify_balance: false,
            ..LoweringConfig::default()
        };
        with_lowerer(&types, &config, |cx| {
            let mut scope = LoopScope::enter(cx, &[]);
            scope.push_type(StaticType::primitive(PrimitiveKind::Double));
            scope.finish().unwrap();
            assert_eq!(cx.code().instructions(), &[Instruction::Pop2]);
        });
    }
}
