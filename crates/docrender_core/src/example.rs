/// Buffer content used when no durable copy exists yet.
pub const EXAMPLE_DOCUMENT: &str = "---
title: Example Document
author: Docrender
subtitle: An automatically generated subtitle
---

# Chapter 1 Introduction

This document was produced from the **docrender** editor.

$ E = mc^2 $

## List test
1. First item
2. Second item
";
