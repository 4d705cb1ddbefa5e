//! Grouping and relationship detection over processed batches

use kubechart_analyzer::{AnalysisError, Analyzer, Detector, DetectorRegistry, ResourceIndex, analyze};
use kubechart_core::{K8sObject, ProcessedResource, RelationType, Relationship, ResourceRef};
use kubechart_processor::ProcessorRegistry;

fn process(docs: &[&str]) -> Vec<ProcessedResource> {
    let registry = ProcessorRegistry::new();
    docs.iter()
        .map(|doc| K8sObject::from_yaml(doc).expect("valid object"))
        .filter_map(|obj| registry.process(&obj).expect("processable"))
        .collect()
}

fn deployment(name: &str, labels: &str, extra_container: &str) -> String {
    format!(
        r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: {name}
  labels: {{app.kubernetes.io/name: {name}}}
spec:
  replicas: 3
  selector:
    matchLabels: {labels}
  template:
    metadata:
      labels: {labels}
    spec:
      containers:
        - name: app
          image: nginx:1.25
{extra_container}
"#
    )
}

fn edges(graph: &kubechart_core::ResourceGraph) -> Vec<String> {
    graph.relationships.iter().map(|r| r.to_string()).collect()
}

const WEBAPP_SERVICE: &str = r#"
apiVersion: v1
kind: Service
metadata:
  name: webapp
  labels: {app.kubernetes.io/name: webapp}
spec:
  selector: {app: webapp}
  ports:
    - port: 80
"#;

#[test]
fn scenario_a_service_selects_deployment() {
    let webapp = deployment("webapp", "{app: webapp}", "");
    let resources = process(&[&webapp, WEBAPP_SERVICE]);
    let graph = analyze(&resources).unwrap();

    assert_eq!(graph.groups.len(), 1);
    assert_eq!(graph.groups[0].name, "webapp");
    assert_eq!(graph.groups[0].len(), 2);
    assert_eq!(edges(&graph), vec!["Service/webapp -[selects]-> Deployment/webapp"]);
}

#[test]
fn scenario_b_shared_configmap() {
    let env_from = "          envFrom:\n            - configMapRef: {name: shared}";
    let api = deployment("api", "{app: api}", env_from);
    let worker = deployment("worker", "{app: worker}", env_from);
    let shared = "apiVersion: v1\nkind: ConfigMap\nmetadata: {name: shared}\ndata: {LOG_LEVEL: info}\n";

    let resources = process(&[&api, &worker, shared]);
    let graph = analyze(&resources).unwrap();

    let names: Vec<&str> = graph.groups.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["api", "worker", "shared"]);

    let cm = ResourceRef::core("ConfigMap", "", "shared");
    let users: Vec<&str> = graph
        .relationships_to(&cm)
        .map(|r| {
            assert_eq!(r.kind, RelationType::UsesConfig);
            r.from.name.as_str()
        })
        .collect();
    assert_eq!(users, vec!["api", "worker"]);
    assert_eq!(graph.cross_group_edges().len(), 2);
}

#[test]
fn partition_keeps_equal_service_names_together() {
    let webapp = deployment("webapp", "{app: webapp}", "");
    let config = "apiVersion: v1\nkind: ConfigMap\nmetadata: {name: webapp-config}\n";
    let other = deployment("other", "{app: other}", "");
    let secret = "apiVersion: v1\nkind: Secret\nmetadata: {name: webapp-secret}\n";

    let resources = process(&[&webapp, config, &other, secret]);
    let graph = analyze(&resources).unwrap();

    assert_eq!(graph.groups.len(), 2);
    assert_eq!(graph.groups[0].name, "webapp");
    assert_eq!(graph.groups[0].len(), 3);
    assert_eq!(graph.resource_count(), resources.len());
    for resource in &resources {
        let owners = graph.groups.iter().filter(|g| g.contains(&resource.reference)).count();
        assert_eq!(owners, 1, "{}", resource.reference);
    }
}

#[test]
fn selector_must_be_subset_and_same_namespace() {
    let web = r#"
apiVersion: apps/v1
kind: Deployment
metadata: {name: web, namespace: prod}
spec:
  selector: {matchLabels: {app: web}}
  template:
    metadata: {labels: {app: web, tier: frontend}}
    spec: {containers: [{name: web, image: web}]}
"#;
    let matching = "apiVersion: v1\nkind: Service\nmetadata: {name: web, namespace: prod}\nspec:\n  selector: {app: web, tier: frontend}\n";
    let too_specific = "apiVersion: v1\nkind: Service\nmetadata: {name: web-canary, namespace: prod}\nspec:\n  selector: {app: web, track: canary}\n";
    let other_ns = "apiVersion: v1\nkind: Service\nmetadata: {name: web, namespace: staging}\nspec:\n  selector: {app: web}\n";
    let empty = "apiVersion: v1\nkind: Service\nmetadata: {name: external, namespace: prod}\nspec:\n  type: ExternalName\n  externalName: example.com\n";

    let graph = analyze(&process(&[web, matching, too_specific, other_ns, empty])).unwrap();
    assert_eq!(edges(&graph), vec!["Service/web -[selects]-> Deployment/web"]);
    let edge = graph.relationships.iter().next().unwrap();
    assert_eq!(edge.from.namespace, "prod");
}

#[test]
fn every_detector_family() {
    let web = deployment("web", "{app: web}", "");
    let docs = [
        web.as_str(),
        "apiVersion: v1\nkind: Service\nmetadata: {name: web}\nspec: {selector: {app: web}}\n",
        r#"
apiVersion: networking.k8s.io/v1
kind: Ingress
metadata: {name: web}
spec:
  rules:
    - host: shop.example.com
      http:
        paths:
          - path: /
            pathType: Prefix
            backend:
              service: {name: web, port: {number: 80}}
"#,
        r#"
apiVersion: gateway.networking.k8s.io/v1
kind: HTTPRoute
metadata: {name: web-route}
spec:
  rules:
    - backendRefs:
        - name: web
          port: 80
"#,
        r#"
apiVersion: autoscaling/v2
kind: HorizontalPodAutoscaler
metadata: {name: web}
spec:
  scaleTargetRef: {apiVersion: apps/v1, kind: Deployment, name: web}
  minReplicas: 2
  maxReplicas: 5
"#,
        r#"
apiVersion: keda.sh/v1alpha1
kind: ScaledObject
metadata: {name: web-keda}
spec:
  scaleTargetRef: {name: web}
"#,
        "apiVersion: policy/v1\nkind: PodDisruptionBudget\nmetadata: {name: web}\nspec:\n  minAvailable: 1\n  selector: {matchLabels: {app: web}}\n",
        r#"
apiVersion: networking.k8s.io/v1
kind: NetworkPolicy
metadata: {name: web}
spec:
  podSelector: {matchLabels: {app: web}}
"#,
        "apiVersion: rbac.authorization.k8s.io/v1\nkind: Role\nmetadata: {name: web}\nrules: []\n",
        r#"
apiVersion: rbac.authorization.k8s.io/v1
kind: RoleBinding
metadata: {name: web}
roleRef: {apiGroup: rbac.authorization.k8s.io, kind: Role, name: web}
subjects:
  - {kind: ServiceAccount, name: web}
"#,
        "apiVersion: rbac.authorization.k8s.io/v1\nkind: ClusterRole\nmetadata: {name: reader}\nrules: []\n",
        r#"
apiVersion: rbac.authorization.k8s.io/v1
kind: ClusterRoleBinding
metadata: {name: reader}
roleRef: {apiGroup: rbac.authorization.k8s.io, kind: ClusterRole, name: reader}
"#,
    ];

    let graph = analyze(&process(&docs)).unwrap();
    let kinds: Vec<RelationType> = graph.relationships.iter().map(|r| r.kind).collect();
    for expected in [
        RelationType::Selects,
        RelationType::RoutesTo,
        RelationType::Scales,
        RelationType::Protects,
        RelationType::BindsRole,
    ] {
        assert!(kinds.contains(&expected), "missing {expected}: {:?}", edges(&graph));
    }

    let rendered = edges(&graph);
    assert!(rendered.contains(&"Ingress/web -[routes-to]-> Service/web".to_string()));
    assert!(rendered.contains(&"HTTPRoute/web-route -[routes-to]-> Service/web".to_string()));
    assert!(rendered.contains(&"ScaledObject/web-keda -[scales]-> Deployment/web".to_string()));
    assert!(rendered.contains(&"NetworkPolicy/web -[selects]-> Deployment/web".to_string()));
    assert!(rendered.contains(&"ClusterRoleBinding/reader -[binds-role]-> ClusterRole/reader".to_string()));
}

#[test]
fn empty_pod_selector_selects_the_namespace() {
    let in_namespace = |name: &str, ns: &str| {
        deployment(name, &format!("{{app: {name}}}"), "")
            .replace(&format!("  name: {name}\n"), &format!("  name: {name}\n  namespace: {ns}\n"))
    };
    let api = in_namespace("api", "prod");
    let worker = in_namespace("worker", "prod");
    let other = in_namespace("other", "staging");
    let deny_all = "apiVersion: networking.k8s.io/v1\nkind: NetworkPolicy\nmetadata: {name: deny-all, namespace: prod}\nspec:\n  podSelector: {}\n  policyTypes: [Ingress]\n";
    let by_expression = r#"
apiVersion: networking.k8s.io/v1
kind: NetworkPolicy
metadata: {name: tiers, namespace: prod}
spec:
  podSelector:
    matchExpressions:
      - {key: tier, operator: In, values: [backend]}
"#;
    let headless = "apiVersion: v1\nkind: Service\nmetadata: {name: manual, namespace: prod}\nspec: {}\n";

    let graph = analyze(&process(&[&api, &worker, &other, deny_all, by_expression, headless])).unwrap();
    assert_eq!(
        edges(&graph),
        vec![
            "NetworkPolicy/deny-all -[selects]-> Deployment/api".to_string(),
            "NetworkPolicy/deny-all -[selects]-> Deployment/worker".to_string(),
        ]
    );
}

#[test]
fn dangling_config_reference_has_no_edge() {
    let env_from = "          envFrom:\n            - secretRef: {name: not-here}";
    let api = deployment("api", "{app: api}", env_from);
    let resources = process(&[&api]);
    assert_eq!(resources[0].dependencies.len(), 1);

    let graph = analyze(&resources).unwrap();
    assert!(graph.relationships.is_empty());
}

#[test]
fn wrong_field_shape_is_fatal() {
    let route = r#"
apiVersion: gateway.networking.k8s.io/v1
kind: HTTPRoute
metadata: {name: broken}
spec:
  rules: "not-a-list"
"#;
    let err = analyze(&process(&[route])).unwrap_err();
    match err {
        AnalysisError::Detector { detector, resource, .. } => {
            assert_eq!(detector, "backend-reference");
            assert_eq!(resource.name, "broken");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn duplicate_resources_are_rejected() {
    let cm = "apiVersion: v1\nkind: ConfigMap\nmetadata: {name: twice}\n";
    let err = analyze(&process(&[cm, cm])).unwrap_err();
    assert!(matches!(err, AnalysisError::Duplicate { .. }));
}

#[test]
fn result_is_independent_of_detector_order() {
    let web = deployment("web", "{app: web}", "          envFrom:\n            - configMapRef: {name: web-config}");
    let docs = [
        web.as_str(),
        WEBAPP_SERVICE,
        "apiVersion: v1\nkind: Service\nmetadata: {name: web}\nspec: {selector: {app: web}}\n",
        "apiVersion: v1\nkind: ConfigMap\nmetadata: {name: web-config}\n",
        "apiVersion: policy/v1\nkind: PodDisruptionBudget\nmetadata: {name: web}\nspec:\n  selector: {matchLabels: {app: web}}\n",
    ];
    let resources = process(&docs);

    let forward = Analyzer::new().analyze(&resources).unwrap();

    assert_eq!(DetectorRegistry::new().names().len(), 6);
    let reversed: Vec<Box<dyn Detector>> =
        DetectorRegistry::new().into_detectors().into_iter().rev().collect();
    let backward = Analyzer::with_detectors(DetectorRegistry::with_detectors(reversed))
        .analyze(&resources)
        .unwrap();

    let forward_edges: Vec<Relationship> = forward.relationships.into_iter().collect();
    let backward_edges: Vec<Relationship> = backward.relationships.into_iter().collect();
    assert_eq!(forward_edges, backward_edges);

    let forward_groups: Vec<String> = forward.groups.iter().map(|g| g.name.clone()).collect();
    let backward_groups: Vec<String> = backward.groups.iter().map(|g| g.name.clone()).collect();
    assert_eq!(forward_groups, backward_groups);

    // index is usable on its own for ad-hoc lookups
    let index = ResourceIndex::new(&resources);
    assert!(index.find("", "ConfigMap", "", "web-config").is_some());
}
